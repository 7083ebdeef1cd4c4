use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use strata_core::layer::upload_color;
use strata_core::stl::write_binary_stl;
use strata_core::{
    compose_store, default_seed, GeometryFormat, GeometryLoader, LayerStore, LoadOutcome, Mesh,
    NodeGeometry, StlLoader,
};

fn load(bytes: &[u8], file_name: &str) -> Result<Mesh, strata_core::GeometryLoadError> {
    let format = GeometryFormat::from_file_name(file_name)?;
    StlLoader.load(bytes, format)
}

#[test]
fn upload_flow_from_bytes_to_scene() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut store = LayerStore::with_seed(&default_seed());

    let bytes = write_binary_stl(&Mesh::cube(50.0));
    let ticket = store.add_upload("Lower_Jaw_Scan_Final.stl", upload_color(&mut rng));

    let outcome = store.complete_load(ticket, load(&bytes, "Lower_Jaw_Scan_Final.stl"));
    let LoadOutcome::Applied { volume } = outcome else {
        panic!("expected applied load, got {:?}", outcome);
    };
    assert_relative_eq!(volume, 125.0, max_relative = 1e-4);

    let layer = store.get(ticket.layer).unwrap();
    assert_eq!(layer.name, "Lower_Jaw_Scan_");
    assert_eq!(layer.volume_label(), "125.0");

    let scene = compose_store(&store);
    assert_eq!(scene.nodes.len(), 4);
    assert!(matches!(scene.nodes[3].geometry, NodeGeometry::Mesh(_)));
}

#[test]
fn failed_upload_renders_placeholder_without_volume() {
    let mut store = LayerStore::new();
    let ticket = store.add_upload("garbage.stl", upload_color(&mut StdRng::seed_from_u64(1)));

    let outcome = store.complete_load(ticket, load(b"not an stl", "garbage.stl"));
    assert_eq!(outcome, LoadOutcome::Failed);

    store.assign_simulated_volumes(&mut StdRng::seed_from_u64(2));
    assert_eq!(store.get(ticket.layer).unwrap().volume, 0.0);

    let scene = compose_store(&store);
    assert_eq!(scene.nodes.len(), 1);
    assert!(matches!(scene.nodes[0].geometry, NodeGeometry::Placeholder(_)));
}

#[test]
fn deletion_while_loading_does_not_resurrect() {
    let mut store = LayerStore::with_seed(&default_seed());
    let ticket = store.add_upload("scan.stl", upload_color(&mut StdRng::seed_from_u64(5)));
    store.remove(ticket.layer);

    let outcome = store.complete_load(ticket, Ok(Mesh::cube(10.0)));
    assert_eq!(outcome, LoadOutcome::Missing);
    assert_eq!(store.len(), 3);
    assert!(store.get(ticket.layer).is_none());

    store.set_volume(ticket.layer, 4.0);
    store.set_opacity(ticket.layer, 0.2);
    store.set_visible(ticket.layer, false);
    assert_eq!(store.len(), 3);
}

#[test]
fn reset_discards_uploads_and_brightness() {
    let mut store = LayerStore::with_seed(&default_seed());
    let ticket = store.add_upload("scan.stl", upload_color(&mut StdRng::seed_from_u64(8)));
    store.set_brightness(0.0);

    store.reset(&default_seed());
    assert_eq!(store.len(), 3);
    assert_eq!(store.brightness(), 1.0);
    assert_eq!(
        store.complete_load(ticket, Ok(Mesh::cube(10.0))),
        LoadOutcome::Missing
    );

    let scene = compose_store(&store);
    assert_eq!(scene.background.to_bytes(), [255, 255, 255]);
}
