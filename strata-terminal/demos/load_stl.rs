/// Example: Load an STL file and report its volume without opening the viewer
///
/// Usage: cargo run --example load_stl -- path/to/file.stl

use std::env;
use std::io;
use std::path::Path;
use strata_core::loader::{self, StlLoader};
use strata_core::{layer, Mesh};

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let (name, mesh) = match args.get(1) {
        Some(stl_path) => {
            let path = Path::new(stl_path);
            let mesh = loader::load_path(&StlLoader, path)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Failed to load STL: {}", e)))?;
            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            (layer::display_name(&file_name), mesh)
        }
        None => {
            eprintln!("Usage: {} <stl-file>", args[0]);
            eprintln!("\nNo STL file provided, using a 100 mm cube...");
            ("cube".to_string(), Mesh::cube(100.0))
        }
    };

    println!("Layer:     {}", name);
    println!("Triangles: {}", mesh.triangle_count());
    if let Some((min, max)) = mesh.bounds() {
        let size = max - min;
        println!("Size (mm): {:.1} x {:.1} x {:.1}", size.x, size.y, size.z);
    }
    println!("Volume:    {:.1} ml", strata_core::mesh_volume_ml(&mesh));

    Ok(())
}
