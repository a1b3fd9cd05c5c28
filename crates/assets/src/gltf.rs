use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AssetError, AssetId};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_HEADER_LEN: usize = 12;
const GLB_CHUNK_HEADER_LEN: usize = 8;
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;

/// Mesh metadata read from the glTF document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshInfo {
    pub name: String,
    pub primitive_count: usize,
}

/// Material metadata read from the glTF document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialInfo {
    pub name: String,
    pub base_color: [f32; 4],
}

impl Default for MaterialInfo {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// A loaded model, ready to be attached as a visual proxy.
///
/// Only metadata is imported; vertex data stays in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHandle {
    pub id: AssetId,
    pub path: PathBuf,
    pub meshes: Vec<MeshInfo>,
    pub materials: Vec<MaterialInfo>,
    pub node_count: usize,
}

impl ModelHandle {
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Base color of the first material, for untextured rendering.
    pub fn tint(&self) -> [f32; 4] {
        self.materials
            .first()
            .map(|m| m.base_color)
            .unwrap_or(MaterialInfo::default().base_color)
    }

    /// File name without extension, for display.
    pub fn display_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Read and parse a `.gltf` or `.glb` file synchronously.
pub fn import_model(path: impl AsRef<Path>) -> Result<ModelHandle, AssetError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    parse_model(path, &data)
}

/// Parse model metadata from in-memory file contents.
///
/// The container is detected from the leading magic, not the extension.
pub fn parse_model(path: &Path, data: &[u8]) -> Result<ModelHandle, AssetError> {
    let json = if data.starts_with(GLB_MAGIC) {
        glb_json_chunk(data)?
    } else {
        data
    };
    let doc: Value = serde_json::from_slice(json)?;
    if !doc.is_object() {
        return Err(AssetError::Gltf("document root is not an object".into()));
    }
    check_version(&doc)?;

    let meshes = array(&doc, "meshes")
        .enumerate()
        .map(|(i, mesh)| MeshInfo {
            name: name_or_index(mesh, "mesh", i),
            primitive_count: mesh
                .get("primitives")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        })
        .collect();

    let materials = array(&doc, "materials")
        .enumerate()
        .map(|(i, mat)| MaterialInfo {
            name: name_or_index(mat, "material", i),
            base_color: base_color(mat),
        })
        .collect();

    Ok(ModelHandle {
        id: AssetId::of_bytes(data),
        path: path.to_path_buf(),
        meshes,
        materials,
        node_count: array(&doc, "nodes").count(),
    })
}

/// Slice out the JSON chunk of a binary glTF container.
fn glb_json_chunk(data: &[u8]) -> Result<&[u8], AssetError> {
    if data.len() < GLB_HEADER_LEN + GLB_CHUNK_HEADER_LEN {
        return Err(AssetError::Gltf("GLB shorter than its headers".into()));
    }
    let version = read_u32(data, 4);
    if version != 2 {
        return Err(AssetError::Gltf(format!("unsupported GLB version {version}")));
    }
    let total = read_u32(data, 8) as usize;
    if total > data.len() {
        return Err(AssetError::Gltf(format!(
            "GLB declares {total} bytes but file has {}",
            data.len()
        )));
    }

    let chunk_len = read_u32(data, GLB_HEADER_LEN) as usize;
    let chunk_type = read_u32(data, GLB_HEADER_LEN + 4);
    if chunk_type != GLB_CHUNK_JSON {
        return Err(AssetError::Gltf(format!(
            "first GLB chunk has type {chunk_type:#010x}, expected JSON"
        )));
    }
    let start = GLB_HEADER_LEN + GLB_CHUNK_HEADER_LEN;
    let end = start
        .checked_add(chunk_len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| AssetError::Gltf("GLB JSON chunk runs past end of file".into()))?;
    Ok(&data[start..end])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn check_version(doc: &Value) -> Result<(), AssetError> {
    let version = doc
        .get("asset")
        .and_then(|a| a.get("version"))
        .and_then(Value::as_str)
        .ok_or_else(|| AssetError::Gltf("missing asset.version".into()))?;
    if !version.starts_with('2') {
        return Err(AssetError::Gltf(format!("unsupported glTF version {version}")));
    }
    Ok(())
}

fn array<'a>(doc: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    doc.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn name_or_index(value: &Value, kind: &str, index: usize) -> String {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{kind}_{index}"))
}

fn base_color(material: &Value) -> [f32; 4] {
    let mut color = MaterialInfo::default().base_color;
    if let Some(factor) = material
        .get("pbrMetallicRoughness")
        .and_then(|pbr| pbr.get("baseColorFactor"))
        .and_then(Value::as_array)
    {
        for (slot, v) in color.iter_mut().zip(factor) {
            if let Some(f) = v.as_f64() {
                *slot = f as f32;
            }
        }
    }
    color
}
