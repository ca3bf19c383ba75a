//! Mesh export: Wavefront OBJ geometry plus a bounds meta document.

use std::path::Path;

use serde_json::json;

use pakrat_core::{MeshData, Result};

use crate::writer::append_ext;

pub(crate) async fn export(data: &MeshData, dest: &Path) -> Result<bool> {
    if data.vertices.is_empty() {
        return Ok(false);
    }

    tokio::fs::write(append_ext(dest, "obj"), render_obj(data)).await?;
    tokio::fs::write(
        append_ext(dest, "meta.json"),
        serde_json::to_vec_pretty(&bounds_meta(data))?,
    )
    .await?;

    Ok(true)
}

fn render_obj(data: &MeshData) -> String {
    let object_name = if data.name.is_empty() {
        "mesh"
    } else {
        &data.name
    };

    // Normals and uvs are only usable when parallel to the vertex array.
    let has_normals = data.normals.len() == data.vertices.len();
    let has_uvs = data.uvs.len() == data.vertices.len();

    let mut out = String::new();
    out.push_str(&format!("o {object_name}\n"));

    for v in &data.vertices {
        out.push_str(&format!("v {} {} {}\n", v[0], v[1], v[2]));
    }
    if has_uvs {
        for t in &data.uvs {
            out.push_str(&format!("vt {} {}\n", t[0], t[1]));
        }
    }
    if has_normals {
        for n in &data.normals {
            out.push_str(&format!("vn {} {} {}\n", n[0], n[1], n[2]));
        }
    }

    let vertex_count = data.vertices.len() as u32;
    for tri in data.indices.chunks_exact(3) {
        if tri.iter().any(|&i| i >= vertex_count) {
            continue;
        }
        // OBJ indices are 1-based; v/vt/vn share the index.
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        let line = match (has_uvs, has_normals) {
            (true, true) => format!("f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}\n"),
            (true, false) => format!("f {a}/{a} {b}/{b} {c}/{c}\n"),
            (false, true) => format!("f {a}//{a} {b}//{b} {c}//{c}\n"),
            (false, false) => format!("f {a} {b} {c}\n"),
        };
        out.push_str(&line);
    }

    out
}

fn bounds_meta(data: &MeshData) -> serde_json::Value {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for v in &data.vertices {
        for axis in 0..3 {
            min[axis] = min[axis].min(v[axis]);
            max[axis] = max[axis].max(v[axis]);
        }
    }

    json!({
        "name": data.name,
        "vertices": data.vertices.len(),
        "triangles": data.indices.len() / 3,
        "bounds": { "min": min, "max": max },
    })
}
