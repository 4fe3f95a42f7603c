use spineframe::{
    graphics::{HeadlessEngine, RenderEngine},
    math::uv,
    runtime::{
        AnimationState, Attachment, BlendMode, Clipper, Color, MeshAttachment, Physics,
        RegionAttachment, Runtime, Skeleton, Slot,
    },
    EngineTexture, SkeletonMesh, SkeletonMeshParams,
};
use std::rc::Rc;

//
// scripted runtime
//

#[derive(Clone)]
struct TestRegion {
    texture: Option<Rc<EngineTexture>>,
    color: Color,
    corners: [f32; 8],
    uvs: [f32; 8],
}

#[derive(Clone)]
struct TestMesh {
    texture: Option<Rc<EngineTexture>>,
    color: Color,
    vertices: Vec<f32>,
    uvs: Vec<f32>,
    triangles: Vec<u16>,
}

#[derive(Clone)]
struct TestClip {
    end_slot: usize,
}

#[derive(Clone)]
enum TestAttachment {
    None,
    Region(TestRegion),
    Mesh(TestMesh),
    Clip(TestClip),
    Other,
}

#[derive(Clone)]
struct TestSlot {
    index: usize,
    active: bool,
    color: Color,
    dark_color: Option<Color>,
    blend_mode: BlendMode,
    attachment: TestAttachment,
}

struct TestSkeleton {
    slots: Vec<TestSlot>,
    color: Color,
    log: Vec<String>,
}

struct TestAnimationState {
    deltas: Vec<f32>,
}

/// Clips by keeping only the first triangle of each attachment.
#[derive(Default)]
struct TestClipper {
    end_slot: Option<usize>,
}

struct TestRuntime;

impl RegionAttachment<TestSlot> for TestRegion {
    fn texture(&self) -> Option<&EngineTexture> {
        self.texture.as_deref()
    }

    fn color(&self) -> Color {
        self.color
    }

    fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    fn compute_world_vertices(
        &self,
        _slot: &TestSlot,
        out: &mut [f32],
        offset: usize,
        stride: usize,
    ) {
        for (i, corner) in self.corners.chunks_exact(2).enumerate() {
            out[offset + i * stride..][..2].copy_from_slice(corner);
        }
    }
}

impl MeshAttachment<TestSlot> for TestMesh {
    fn texture(&self) -> Option<&EngineTexture> {
        self.texture.as_deref()
    }

    fn color(&self) -> Color {
        self.color
    }

    fn world_vertices_length(&self) -> usize {
        self.vertices.len()
    }

    fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    fn triangles(&self) -> &[u16] {
        &self.triangles
    }

    fn compute_world_vertices(
        &self,
        _slot: &TestSlot,
        start: usize,
        count: usize,
        out: &mut [f32],
        offset: usize,
        stride: usize,
    ) {
        for (i, vert) in self.vertices[start..start + count]
            .chunks_exact(2)
            .enumerate()
        {
            out[offset + i * stride..][..2].copy_from_slice(vert);
        }
    }
}

impl Slot for TestSlot {
    type Texture = EngineTexture;
    type Region = TestRegion;
    type Mesh = TestMesh;
    type Clipping = TestClip;

    fn is_bone_active(&self) -> bool {
        self.active
    }

    fn color(&self) -> Color {
        self.color
    }

    fn dark_color(&self) -> Option<Color> {
        self.dark_color
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    fn attachment(&self) -> Option<Attachment<'_, Self>> {
        match &self.attachment {
            TestAttachment::None => None,
            TestAttachment::Region(region) => Some(Attachment::Region(region)),
            TestAttachment::Mesh(mesh) => Some(Attachment::Mesh(mesh)),
            TestAttachment::Clip(clip) => Some(Attachment::Clipping(clip)),
            TestAttachment::Other => Some(Attachment::Other),
        }
    }
}

impl Skeleton for TestSkeleton {
    type Slot = TestSlot;

    fn color(&self) -> Color {
        self.color
    }

    fn update(&mut self, delta: f32) {
        self.log.push(format!("update {delta}"));
    }

    fn update_world_transform(&mut self, physics: Physics) {
        self.log.push(format!("world {physics:?}"));
    }

    fn draw_order(&self) -> impl Iterator<Item = &TestSlot> {
        self.slots.iter()
    }
}

impl AnimationState for TestAnimationState {
    type Skeleton = TestSkeleton;

    fn update(&mut self, delta: f32) {
        self.deltas.push(delta);
    }

    fn apply(&mut self, skeleton: &mut TestSkeleton) -> bool {
        skeleton.log.push("apply".to_string());
        true
    }
}

impl Clipper<TestSlot> for TestClipper {
    fn clip_start(&mut self, _slot: &TestSlot, clip: &TestClip) {
        self.end_slot = Some(clip.end_slot);
    }

    fn clip_end_with_slot(&mut self, slot: &TestSlot) {
        if self.end_slot == Some(slot.index) {
            self.end_slot = None;
        }
    }

    fn clip_end(&mut self) {
        self.end_slot = None;
    }

    fn is_clipping(&self) -> bool {
        self.end_slot.is_some()
    }

    fn clip_triangles(
        &mut self,
        vertices: &[f32],
        triangles: &[u16],
        stride: usize,
        out_vertices: &mut Vec<f32>,
        out_triangles: &mut Vec<u16>,
    ) {
        for (i, &tri) in triangles.iter().take(3).enumerate() {
            out_vertices.extend_from_slice(&vertices[tri as usize * stride..][..stride]);
            out_triangles.push(i as u16);
        }
    }
}

impl Runtime for TestRuntime {
    type SkeletonData = [TestSlot];
    type Skeleton = TestSkeleton;
    type AnimationState = TestAnimationState;
    type Clipper = TestClipper;

    fn new_skeleton(data: &[TestSlot]) -> TestSkeleton {
        TestSkeleton {
            slots: data.to_vec(),
            color: Color::WHITE,
            log: Vec::new(),
        }
    }

    fn new_animation_state(_data: &[TestSlot]) -> TestAnimationState {
        TestAnimationState { deltas: Vec::new() }
    }

    fn new_clipper() -> TestClipper {
        TestClipper::default()
    }
}

//
// helpers
//

fn page(engine: &mut HeadlessEngine) -> Rc<EngineTexture> {
    Rc::new(EngineTexture::new(
        engine,
        spineframe::image::RgbaImage::new(2, 2),
        "page",
    ))
}

fn slot(index: usize, attachment: TestAttachment) -> TestSlot {
    TestSlot {
        index,
        active: true,
        color: Color::WHITE,
        dark_color: None,
        blend_mode: BlendMode::Normal,
        attachment,
    }
}

fn region(texture: Option<Rc<EngineTexture>>, x: f32) -> TestAttachment {
    TestAttachment::Region(TestRegion {
        texture,
        color: Color::WHITE,
        corners: [x, 0., x + 1., 0., x + 1., 1., x, 1.],
        uvs: [0., 1., 1., 1., 1., 0., 0., 0.],
    })
}

fn fan_mesh(texture: Option<Rc<EngineTexture>>, vert_count: usize) -> TestAttachment {
    let vertices: Vec<f32> = (0..vert_count)
        .flat_map(|i| {
            let angle = i as f32 / vert_count as f32 * std::f32::consts::TAU;
            [angle.cos(), angle.sin()]
        })
        .collect();
    let triangles = (1..vert_count as u16 - 1)
        .flat_map(|i| [0, i, i + 1])
        .collect();
    TestAttachment::Mesh(TestMesh {
        texture,
        color: Color::WHITE,
        uvs: vec![0.5; vert_count * 2],
        vertices,
        triangles,
    })
}

fn skeleton_mesh(
    engine: &mut HeadlessEngine,
    slots: &[TestSlot],
    params: SkeletonMeshParams,
) -> SkeletonMesh<TestRuntime> {
    SkeletonMesh::new(engine, slots, params)
}

/// Total vertices uploaded by the batchers used on the last frame.
fn drawn_vertex_count(engine: &HeadlessEngine, mesh: &SkeletonMesh<TestRuntime>) -> usize {
    mesh.batchers()[..mesh.active_batch_count()]
        .iter()
        .map(|b| engine.mesh(b.mesh()).unwrap().vertex_count())
        .sum()
}

//
// tests
//

#[test]
fn update_drives_the_runtime_in_order() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let mut mesh = skeleton_mesh(
        &mut engine,
        &[slot(0, region(Some(tex), 0.))],
        SkeletonMeshParams::default(),
    );

    mesh.update(&mut engine, 0.25);
    itertools::assert_equal(mesh.animation_state.deltas.iter().copied(), [0.25]);
    itertools::assert_equal(
        mesh.skeleton.log.iter().map(String::as_str),
        ["apply", "update 0.25", "world Update"],
    );
    assert_eq!(mesh.active_batch_count(), 1);
}

#[test]
fn vertices_are_tinted_offset_and_textured() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let mut first = slot(0, region(Some(tex.clone()), 0.));
    first.color = Color::new(0.5, 0.5, 0.5, 1.);
    if let TestAttachment::Region(r) = &mut first.attachment {
        r.color = Color::new(1., 1., 1., 0.5);
    }
    let second = slot(1, region(Some(tex), 2.));

    let mut mesh = skeleton_mesh(&mut engine, &[first, second], SkeletonMeshParams::default());
    mesh.update(&mut engine, 0.);

    let uploaded = engine.mesh(mesh.batchers()[0].mesh()).unwrap();
    assert_eq!(uploaded.vertex_count(), 8);
    assert_eq!(&uploaded.colors[..4], &[0.5, 0.5, 0.5, 0.5]);
    assert_eq!(&uploaded.colors[16..20], &[1., 1., 1., 1.]);
    // second slot is pushed forward by z_offset
    assert_eq!(&uploaded.positions[..3], &[0., 0., 0.]);
    assert_eq!(&uploaded.positions[12..15], &[2., 0., 0.1]);
    assert_eq!(&uploaded.uvs[..4], &[0., 1., 1., 1.]);
    itertools::assert_equal(
        uploaded.indices.iter().copied(),
        [0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4],
    );
    // same texture and blend mode, one material
    assert_eq!(uploaded.materials.len(), 1);
    assert!(uploaded.dark_colors.is_none());
}

#[test]
fn overflow_rolls_over_and_the_pool_never_shrinks() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let slots: Vec<TestSlot> = (0..5)
        .map(|i| slot(i, region(Some(tex.clone()), i as f32)))
        .collect();
    let params = SkeletonMeshParams {
        max_vertices: 10,
        ..Default::default()
    };
    let mut mesh = skeleton_mesh(&mut engine, &slots, params);

    mesh.update(&mut engine, 0.);
    assert_eq!(mesh.batchers().len(), 3);
    assert_eq!(mesh.active_batch_count(), 3);
    itertools::assert_equal(
        mesh.batchers()
            .iter()
            .map(|b| engine.mesh(b.mesh()).unwrap().vertex_count()),
        [8, 8, 4],
    );
    for b in mesh.batchers() {
        let uploaded = engine.mesh(b.mesh()).unwrap();
        assert_eq!(uploaded.parent, Some(mesh.node()));
        assert!(uploaded
            .indices
            .iter()
            .all(|&i| (i as usize) < uploaded.vertex_count()));
    }

    mesh.skeleton.slots.truncate(1);
    mesh.update(&mut engine, 0.);
    assert_eq!(mesh.batchers().len(), 3);
    assert_eq!(mesh.active_batch_count(), 1);
    itertools::assert_equal(
        mesh.batchers()
            .iter()
            .map(|b| engine.mesh(b.mesh()).unwrap().enabled),
        [true, false, false],
    );
    assert_eq!(engine.enabled_meshes().count(), 1);
}

#[test]
fn undrawable_slots_are_skipped() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let mut inactive = slot(1, region(Some(tex.clone()), 1.));
    inactive.active = false;
    let slots = [
        slot(0, region(Some(tex.clone()), 0.)),
        inactive,
        slot(2, region(None, 2.)),
        slot(3, fan_mesh(None, 5)),
        slot(4, TestAttachment::Other),
        slot(5, TestAttachment::None),
        slot(6, region(Some(tex), 6.)),
    ];
    let mut mesh = skeleton_mesh(&mut engine, &slots, SkeletonMeshParams::default());
    mesh.update(&mut engine, 0.);

    assert_eq!(mesh.active_batch_count(), 1);
    let batch = &mesh.batchers()[0];
    assert_eq!(batch.vertex_count(), 8);
    assert_eq!(batch.index_count(), 12);
    // skipped slots don't advance z
    let uploaded = engine.mesh(batch.mesh()).unwrap();
    assert_eq!(&uploaded.positions[12..15], &[6., 0., 0.1]);
}

#[test]
fn clipped_slots_go_through_the_clipper() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let slots = [
        slot(0, TestAttachment::Clip(TestClip { end_slot: 2 })),
        slot(1, region(Some(tex.clone()), 0.)),
        slot(2, fan_mesh(Some(tex.clone()), 6)),
        slot(3, region(Some(tex), 4.)),
    ];
    let mut mesh = skeleton_mesh(&mut engine, &slots, SkeletonMeshParams::default());
    mesh.update(&mut engine, 0.);

    let batch = &mesh.batchers()[0];
    assert_eq!(batch.vertex_count(), 3 + 3 + 4);
    assert_eq!(batch.index_count(), 3 + 3 + 6);
    itertools::assert_equal(
        batch.material_groups().iter().map(|g| (g.index_start, g.index_count)),
        [(0, 3), (3, 3), (6, 6)],
    );
    assert!(batch
        .indices()
        .iter()
        .all(|&i| (i as usize) < batch.vertex_count()));
}

#[test]
fn two_color_tint_uploads_dark_colors() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let mut dark = slot(0, region(Some(tex.clone()), 0.));
    dark.dark_color = Some(Color::new(0.1, 0.2, 0.3, 1.));
    let slots = [dark, slot(1, fan_mesh(Some(tex), 3))];
    let params = SkeletonMeshParams {
        two_color_tint: true,
        ..Default::default()
    };
    let mut mesh = skeleton_mesh(&mut engine, &slots, params);
    mesh.update(&mut engine, 0.);

    let uploaded = engine.mesh(mesh.batchers()[0].mesh()).unwrap();
    assert_eq!(uploaded.vertex_count(), 7);
    let dark_colors = uploaded.dark_colors.as_ref().unwrap();
    assert_eq!(&dark_colors[..4], &[0.1, 0.2, 0.3, 1.]);
    // slots without a dark color get zero
    assert!(dark_colors[16..].iter().all(|&c| c == 0.));
    assert_eq!(&uploaded.uvs[8..10], &[0.5, 0.5]);
}

#[test]
fn oversized_attachments_are_skipped() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let params = SkeletonMeshParams {
        max_vertices: 10,
        ..Default::default()
    };

    // too large on an empty batcher: no new batcher is taken
    let slots = [
        slot(0, fan_mesh(Some(tex.clone()), 12)),
        slot(1, region(Some(tex.clone()), 0.)),
    ];
    let mut mesh = skeleton_mesh(&mut engine, &slots, params.clone());
    mesh.update(&mut engine, 0.);
    assert_eq!(mesh.batchers().len(), 1);
    assert_eq!(drawn_vertex_count(&engine, &mesh), 4);

    // after other geometry: rolls over once, then the next slot continues there
    let slots = [
        slot(0, region(Some(tex.clone()), 0.)),
        slot(1, fan_mesh(Some(tex.clone()), 12)),
        slot(2, region(Some(tex), 1.)),
    ];
    let mut mesh = skeleton_mesh(&mut engine, &slots, params);
    mesh.update(&mut engine, 0.);
    assert_eq!(mesh.active_batch_count(), 2);
    assert_eq!(drawn_vertex_count(&engine, &mesh), 8);
}

#[test]
fn blend_modes_select_materials() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let mut additive = slot(1, region(Some(tex.clone()), 1.));
    additive.blend_mode = BlendMode::Additive;
    let mut screen = slot(2, region(Some(tex.clone()), 2.));
    screen.blend_mode = BlendMode::Screen;
    let slots = [slot(0, region(Some(tex), 0.)), additive, screen];

    let mut mesh = skeleton_mesh(&mut engine, &slots, SkeletonMeshParams::default());
    mesh.update(&mut engine, 0.);

    let uploaded = engine.mesh(mesh.batchers()[0].mesh()).unwrap();
    assert_eq!(uploaded.materials.len(), 2);
    itertools::assert_equal(
        uploaded.submeshes.iter().map(|s| s.material_index),
        [0, 1, 0],
    );

    // materials persist across frames
    mesh.update(&mut engine, 0.);
    assert_eq!(engine.material_count(), 2);
}

#[test]
fn transform_and_dispose() {
    let mut engine = HeadlessEngine::new();
    let tex = page(&mut engine);
    let root = engine.create_node("root");
    let mut mesh = skeleton_mesh(
        &mut engine,
        &[slot(0, region(Some(tex), 0.))],
        SkeletonMeshParams::default(),
    );
    mesh.set_parent(&mut engine, Some(root));
    mesh.set_transform(
        &mut engine,
        spineframe::math::transform_2d(uv::Vec2::new(3., 0.), 0., 2.),
    );
    mesh.update(&mut engine, 0.);

    let world = engine.world_transform(mesh.node());
    assert_eq!(
        world.transform_point3(uv::Vec3::new(1., 1., 0.)),
        uv::Vec3::new(5., 2., 0.)
    );

    let node = mesh.node();
    mesh.dispose(&mut engine);
    assert_eq!(engine.mesh_count(), 0);
    assert_eq!(engine.material_count(), 0);
    assert!(engine.node(node).is_none());
    // textures belong to the atlas, not the skeleton
    assert_eq!(engine.texture_count(), 1);
}
