use bitflags::bitflags;
use byteorder::{NativeEndian, ReadBytesExt};
use glam::{Vec2, Vec3, Vec4};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, Write};
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::{AnimError, Result};
use crate::io_ext::{ReadExt, WriteExt, ensure_available, expect_magic, read_cstring};
use crate::texture::TextureSlot;

/// Magic tag of model files ("modl" on disk on little-endian hosts)
pub const MODEL_MAGIC: u32 = u32::from_be_bytes(*b"ldom");

/// Position, normal and texture coordinates
pub const BASE_VERTEX_SIZE: usize = 32;
/// Tangent vector
pub const TANGENT_SIZE: usize = 12;
/// Packed joint indices plus four weights
pub const JOINT_DATA_SIZE: usize = 20;

bitflags! {
    /// Optional per-vertex attributes present in a model's vertex buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VertexFlags: u32 {
        /// A tangent vector follows the texture coordinates
        const HAS_TANGENT = 0x1;
        /// Four joint indices (one byte each) and four weights follow
        const HAS_JOINT_DATA = 0x2;
    }
}

impl VertexFlags {
    /// Bytes per vertex for this attribute set
    pub fn vertex_stride(self) -> usize {
        let mut stride = BASE_VERTEX_SIZE;
        if self.contains(Self::HAS_TANGENT) {
            stride += TANGENT_SIZE;
        }
        if self.contains(Self::HAS_JOINT_DATA) {
            stride += JOINT_DATA_SIZE;
        }
        stride
    }

    /// Attribute offsets for the rendering collaborator
    pub fn layout(self) -> VertexLayout {
        let mut attributes = Vec::with_capacity(6);
        let mut offset = 0;
        let mut push = |kind, format: AttributeFormat| {
            attributes.push(VertexAttribute {
                kind,
                format,
                offset,
            });
            offset += format.size();
        };

        push(AttributeKind::Position, AttributeFormat::Float32x3);
        push(AttributeKind::Normal, AttributeFormat::Float32x3);
        push(AttributeKind::TexCoords, AttributeFormat::Float32x2);
        if self.contains(Self::HAS_TANGENT) {
            push(AttributeKind::Tangent, AttributeFormat::Float32x3);
        }
        if self.contains(Self::HAS_JOINT_DATA) {
            push(AttributeKind::JointIndices, AttributeFormat::Uint8x4);
            push(AttributeKind::JointWeights, AttributeFormat::Float32x4);
        }

        VertexLayout {
            stride: self.vertex_stride(),
            attributes,
        }
    }
}

/// Meaning of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeKind {
    Position,
    Normal,
    TexCoords,
    Tangent,
    JointIndices,
    JointWeights,
}

/// Storage format of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
    Float32x4,
    /// Four unsigned bytes packed in one 32-bit word
    Uint8x4,
}

impl AttributeFormat {
    pub const fn size(self) -> usize {
        match self {
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
            Self::Uint8x4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexAttribute {
    pub kind: AttributeKind,
    pub format: AttributeFormat,
    /// Byte offset from the start of the vertex
    pub offset: usize,
}

/// Interleaved vertex buffer layout
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn attribute(&self, kind: AttributeKind) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.kind == kind)
    }
}

/// Model file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub magic: u32,
    pub mesh_count: u32,
    pub vertex_count: u32,
    pub index_count: u32,
    pub material_count: u32,
    pub vertex_flags: VertexFlags,
}

impl ModelHeader {
    pub const SIZE: u64 = 24;

    pub fn parse<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let magic = expect_magic(reader, MODEL_MAGIC, "model")?;
        let mesh_count = reader.read_u32_ne()?;
        let vertex_count = reader.read_u32_ne()?;
        let index_count = reader.read_u32_ne()?;
        let material_count = reader.read_u32_ne()?;
        let raw_flags = reader.read_u32_ne()?;

        let vertex_flags = VertexFlags::from_bits_truncate(raw_flags);
        if vertex_flags.bits() != raw_flags {
            log::warn!("Ignoring unknown vertex flag bits: {raw_flags:#x}");
        }

        Ok(Self {
            magic,
            mesh_count,
            vertex_count,
            index_count,
            material_count,
            vertex_flags,
        })
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32_ne(self.magic)?;
        writer.write_u32_ne(self.mesh_count)?;
        writer.write_u32_ne(self.vertex_count)?;
        writer.write_u32_ne(self.index_count)?;
        writer.write_u32_ne(self.material_count)?;
        writer.write_u32_ne(self.vertex_flags.bits())?;
        Ok(())
    }
}

/// A drawable range of the index buffer with one material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshDescriptor {
    pub index_begin: u32,
    /// Inclusive
    pub index_end: u32,
    pub material_index: u32,
}

impl MeshDescriptor {
    pub const RECORD_SIZE: u64 = 12;

    pub fn index_range(&self) -> RangeInclusive<usize> {
        self.index_begin as usize..=self.index_end as usize
    }

    pub fn index_count(&self) -> usize {
        (self.index_end as usize + 1).saturating_sub(self.index_begin as usize)
    }

    fn parse<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            index_begin: reader.read_u32_ne()?,
            index_end: reader.read_u32_ne()?,
            material_index: reader.read_u32_ne()?,
        })
    }

    fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32_ne(self.index_begin)?;
        writer.write_u32_ne(self.index_end)?;
        writer.write_u32_ne(self.material_index)?;
        Ok(())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MaterialFlags: u32 {
        /// The diffuse map's alpha channel is coverage; draw after opaque meshes
        const DIFFUSE_WITH_ALPHA = 0x1;
    }
}

impl Default for MaterialFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// On-disk material record variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MaterialLayout {
    /// Coefficients only, no flags word
    Legacy,
    /// Coefficients followed by a `u32` flags word
    #[default]
    Flagged,
}

impl MaterialLayout {
    /// Fixed bytes per material before the texture names
    pub const fn fixed_size(self) -> u64 {
        match self {
            Self::Legacy => 28,
            Self::Flagged => 32,
        }
    }
}

/// Phong material coefficients and texture names.
///
/// An empty texture name selects a placeholder texture.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhongMaterial {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub flags: MaterialFlags,
    pub diffuse_map: String,
    pub specular_map: String,
    pub normal_map: String,
}

impl PhongMaterial {
    pub fn has_alpha(&self) -> bool {
        self.flags.contains(MaterialFlags::DIFFUSE_WITH_ALPHA)
    }

    pub fn texture_name(&self, slot: TextureSlot) -> &str {
        match slot {
            TextureSlot::Diffuse => &self.diffuse_map,
            TextureSlot::Specular => &self.specular_map,
            TextureSlot::Normal => &self.normal_map,
        }
    }

    fn parse<R: BufRead + ?Sized>(
        reader: &mut R,
        layout: MaterialLayout,
        index: usize,
    ) -> Result<Self> {
        let diffuse = reader.read_vec3()?;
        let specular = reader.read_vec3()?;
        let shininess = reader.read_f32_ne()?;
        let flags = match layout {
            MaterialLayout::Legacy => MaterialFlags::empty(),
            MaterialLayout::Flagged => MaterialFlags::from_bits_retain(reader.read_u32_ne()?),
        };
        let diffuse_map = read_cstring(reader, &format!("diffuse map of material {index}"))?;
        let specular_map = read_cstring(reader, &format!("specular map of material {index}"))?;
        let normal_map = read_cstring(reader, &format!("normal map of material {index}"))?;

        Ok(Self {
            diffuse,
            specular,
            shininess,
            flags,
            diffuse_map,
            specular_map,
            normal_map,
        })
    }

    fn write<W: Write + ?Sized>(&self, writer: &mut W, layout: MaterialLayout) -> Result<()> {
        writer.write_vec3(self.diffuse)?;
        writer.write_vec3(self.specular)?;
        writer.write_f32_ne(self.shininess)?;
        if layout == MaterialLayout::Flagged {
            writer.write_u32_ne(self.flags.bits())?;
        }
        writer.write_cstring(&self.diffuse_map)?;
        writer.write_cstring(&self.specular_map)?;
        writer.write_cstring(&self.normal_map)?;
        Ok(())
    }
}

/// Options for decoding model files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub material_layout: MaterialLayout,
}

/// Up to four joints influencing a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointInfluence {
    pub indices: [u8; 4],
    pub weights: Vec4,
}

/// A decoded vertex
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
    pub tangent: Option<Vec3>,
    pub joints: Option<JointInfluence>,
}

impl Vertex {
    fn decode(mut bytes: &[u8], flags: VertexFlags) -> io::Result<Self> {
        let position = bytes.read_vec3()?;
        let normal = bytes.read_vec3()?;
        let tex_coords = Vec2::new(bytes.read_f32_ne()?, bytes.read_f32_ne()?);

        let tangent = if flags.contains(VertexFlags::HAS_TANGENT) {
            Some(bytes.read_vec3()?)
        } else {
            None
        };

        let joints = if flags.contains(VertexFlags::HAS_JOINT_DATA) {
            let mut indices = [0u8; 4];
            bytes.read_exact(&mut indices)?;
            let weights = Vec4::new(
                bytes.read_f32_ne()?,
                bytes.read_f32_ne()?,
                bytes.read_f32_ne()?,
                bytes.read_f32_ne()?,
            );
            Some(JointInfluence { indices, weights })
        } else {
            None
        };

        Ok(Self {
            position,
            normal,
            tex_coords,
            tangent,
            joints,
        })
    }

    /// Encode with the given attribute set. Attributes the flags require but
    /// the vertex lacks are written as zeros.
    pub fn encode<W: Write + ?Sized>(&self, writer: &mut W, flags: VertexFlags) -> Result<()> {
        writer.write_vec3(self.position)?;
        writer.write_vec3(self.normal)?;
        writer.write_f32_ne(self.tex_coords.x)?;
        writer.write_f32_ne(self.tex_coords.y)?;

        if flags.contains(VertexFlags::HAS_TANGENT) {
            writer.write_vec3(self.tangent.unwrap_or(Vec3::ZERO))?;
        }
        if flags.contains(VertexFlags::HAS_JOINT_DATA) {
            let joints = self.joints.unwrap_or(JointInfluence {
                indices: [0; 4],
                weights: Vec4::ZERO,
            });
            writer.write_all(&joints.indices)?;
            for w in joints.weights.to_array() {
                writer.write_f32_ne(w)?;
            }
        }
        Ok(())
    }
}

/// Decoded contents of a model file.
///
/// The vertex buffer is kept as raw interleaved bytes ready for upload; use
/// [`ModelData::vertex`] or [`ModelData::vertices`] to inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub name: String,
    pub vertex_flags: VertexFlags,
    pub meshes: Vec<MeshDescriptor>,
    pub vertex_data: Vec<u8>,
    pub indices: Vec<u32>,
    pub materials: Vec<PhongMaterial>,
}

impl ModelData {
    /// Build a model from decoded vertices
    pub fn from_vertices(
        name: impl Into<String>,
        vertex_flags: VertexFlags,
        vertices: &[Vertex],
        meshes: Vec<MeshDescriptor>,
        indices: Vec<u32>,
        materials: Vec<PhongMaterial>,
    ) -> Result<Self> {
        let mut vertex_data = Vec::with_capacity(vertices.len() * vertex_flags.vertex_stride());
        for vertex in vertices {
            vertex.encode(&mut vertex_data, vertex_flags)?;
        }

        Ok(Self {
            name: name.into(),
            vertex_flags,
            meshes,
            vertex_data,
            indices,
            materials,
        })
    }

    /// Parse a model file
    pub fn parse<R: BufRead + Seek>(
        reader: &mut R,
        name: impl Into<String>,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let name = name.into();
        let header = ModelHeader::parse(reader)?;
        let stride = header.vertex_flags.vertex_stride();

        let mesh_bytes = u64::from(header.mesh_count) * MeshDescriptor::RECORD_SIZE;
        let vertex_bytes = u64::from(header.vertex_count) * stride as u64;
        let index_bytes = u64::from(header.index_count) * 4;
        // Three string terminators per material at minimum
        let material_bytes =
            u64::from(header.material_count) * (options.material_layout.fixed_size() + 3);
        ensure_available(
            reader,
            mesh_bytes + vertex_bytes + index_bytes + material_bytes,
            || {
                format!(
                    "model '{}' with {} meshes, {} vertices, {} indices and {} materials",
                    name,
                    header.mesh_count,
                    header.vertex_count,
                    header.index_count,
                    header.material_count
                )
            },
        )?;

        let mut meshes = Vec::with_capacity(header.mesh_count as usize);
        for _ in 0..header.mesh_count {
            meshes.push(MeshDescriptor::parse(reader)?);
        }

        let mut vertex_data = vec![0u8; vertex_bytes as usize];
        reader.read_exact(&mut vertex_data)?;

        let mut indices = vec![0u32; header.index_count as usize];
        reader.read_u32_into::<NativeEndian>(&mut indices)?;

        let mut materials = Vec::with_capacity(header.material_count as usize);
        for i in 0..header.material_count as usize {
            materials.push(PhongMaterial::parse(reader, options.material_layout, i)?);
        }

        log::debug!(
            "Parsed model '{}': {} meshes, {} vertices ({} bytes each), {} indices, {} materials",
            name,
            meshes.len(),
            header.vertex_count,
            stride,
            indices.len(),
            materials.len()
        );

        Ok(Self {
            name,
            vertex_flags: header.vertex_flags,
            meshes,
            vertex_data,
            indices,
            materials,
        })
    }

    /// Load a model file, naming the model after the file stem
    pub fn load<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut reader = BufReader::new(File::open(path)?);
        Self::parse(&mut reader, name, options)
    }

    /// Write the model in the file format
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W, layout: MaterialLayout) -> Result<()> {
        ModelHeader {
            magic: MODEL_MAGIC,
            mesh_count: self.meshes.len() as u32,
            vertex_count: self.vertex_count() as u32,
            index_count: self.indices.len() as u32,
            material_count: self.materials.len() as u32,
            vertex_flags: self.vertex_flags,
        }
        .write(writer)?;

        for mesh in &self.meshes {
            mesh.write(writer)?;
        }
        writer.write_all(&self.vertex_data)?;
        for &index in &self.indices {
            writer.write_u32_ne(index)?;
        }
        for material in &self.materials {
            material.write(writer, layout)?;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, layout: MaterialLayout) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer, layout)?;
        writer.flush()?;
        Ok(())
    }

    pub fn stride(&self) -> usize {
        self.vertex_flags.vertex_stride()
    }

    pub fn layout(&self) -> VertexLayout {
        self.vertex_flags.layout()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_data.len() / self.stride()
    }

    pub fn is_skinned(&self) -> bool {
        self.vertex_flags.contains(VertexFlags::HAS_JOINT_DATA)
    }

    /// Decode one vertex from the interleaved buffer
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        let stride = self.stride();
        let start = index.checked_mul(stride)?;
        let bytes = self.vertex_data.get(start..start.checked_add(stride)?)?;
        Vertex::decode(bytes, self.vertex_flags).ok()
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.vertex_data
            .chunks_exact(self.stride())
            .filter_map(|bytes| Vertex::decode(bytes, self.vertex_flags).ok())
    }

    pub fn material(&self, mesh: &MeshDescriptor) -> Option<&PhongMaterial> {
        self.materials.get(mesh.material_index as usize)
    }

    /// Check that meshes, materials and indices reference data that exists
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertex_count();

        for (i, mesh) in self.meshes.iter().enumerate() {
            if mesh.index_begin > mesh.index_end {
                return Err(AnimError::precondition(format!(
                    "mesh {i} has an empty index range {}..={}",
                    mesh.index_begin, mesh.index_end
                )));
            }
            if mesh.index_end as usize >= self.indices.len() {
                return Err(AnimError::precondition(format!(
                    "mesh {i} ends at index {} but the model has {} indices",
                    mesh.index_end,
                    self.indices.len()
                )));
            }
            if self.material(mesh).is_none() {
                return Err(AnimError::precondition(format!(
                    "mesh {i} uses material {} but the model has {} materials",
                    mesh.material_index,
                    self.materials.len()
                )));
            }
        }

        if let Some((i, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertex_count)
        {
            return Err(AnimError::precondition(format!(
                "index {i} references vertex {index} but the model has {vertex_count} vertices"
            )));
        }

        Ok(())
    }

    /// Check that every skinned vertex references an existing joint
    pub fn validate_joint_indices(&self, joint_count: usize) -> Result<()> {
        for (i, vertex) in self.vertices().enumerate() {
            if let Some(joints) = vertex.joints
                && let Some(&bad) = joints.indices.iter().find(|&&j| j as usize >= joint_count)
            {
                return Err(AnimError::precondition(format!(
                    "vertex {i} references joint {bad} but the skeleton has {joint_count} joints"
                )));
            }
        }
        Ok(())
    }

    /// Reorder meshes so opaque ones draw before meshes with alpha, keeping
    /// the relative order within each group
    pub fn partition_opaque_first(&mut self) {
        let materials = &self.materials;
        self.meshes.sort_by_key(|mesh| {
            materials
                .get(mesh.material_index as usize)
                .is_some_and(PhongMaterial::has_alpha)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use test_case::test_case;

    fn material(alpha: bool, diffuse_map: &str) -> PhongMaterial {
        PhongMaterial {
            diffuse: Vec3::ONE,
            specular: Vec3::splat(0.5),
            shininess: 32.0,
            flags: if alpha {
                MaterialFlags::DIFFUSE_WITH_ALPHA
            } else {
                MaterialFlags::empty()
            },
            diffuse_map: diffuse_map.to_string(),
            specular_map: String::new(),
            normal_map: String::new(),
        }
    }

    fn vertex(x: f32) -> Vertex {
        Vertex {
            position: Vec3::new(x, 0.0, 0.0),
            normal: Vec3::Y,
            tex_coords: Vec2::new(x, 1.0),
            tangent: Some(Vec3::X),
            joints: Some(JointInfluence {
                indices: [0, 1, 0, 0],
                weights: Vec4::new(0.75, 0.25, 0.0, 0.0),
            }),
        }
    }

    fn triangle_model(flags: VertexFlags) -> ModelData {
        ModelData::from_vertices(
            "triangle",
            flags,
            &[vertex(0.0), vertex(1.0), vertex(2.0)],
            vec![
                MeshDescriptor {
                    index_begin: 0,
                    index_end: 2,
                    material_index: 1,
                },
                MeshDescriptor {
                    index_begin: 3,
                    index_end: 5,
                    material_index: 0,
                },
            ],
            vec![0, 1, 2, 2, 1, 0],
            vec![material(false, "body.png"), material(true, "hair.png")],
        )
        .unwrap()
    }

    #[test_case(VertexFlags::empty(), 32 ; "base")]
    #[test_case(VertexFlags::HAS_TANGENT, 44 ; "tangent")]
    #[test_case(VertexFlags::HAS_JOINT_DATA, 52 ; "joint data")]
    #[test_case(VertexFlags::all(), 64 ; "all")]
    fn test_vertex_stride(flags: VertexFlags, stride: usize) {
        assert_eq!(flags.vertex_stride(), stride);
        assert_eq!(flags.layout().stride, stride);
    }

    #[test]
    fn test_layout_offsets() {
        let layout = VertexFlags::HAS_JOINT_DATA.layout();
        assert_eq!(layout.attribute(AttributeKind::Tangent), None);
        assert_eq!(layout.attribute(AttributeKind::JointIndices).map(|a| a.offset), Some(32));
        assert_eq!(layout.attribute(AttributeKind::JointWeights).map(|a| a.offset), Some(36));

        let layout = VertexFlags::all().layout();
        assert_eq!(layout.attribute(AttributeKind::Tangent).map(|a| a.offset), Some(32));
        assert_eq!(layout.attribute(AttributeKind::JointIndices).map(|a| a.offset), Some(44));
    }

    #[test]
    fn test_flags_tested_individually() {
        // Tangent only: joint data must not be assumed
        let model = triangle_model(VertexFlags::HAS_TANGENT);
        assert!(!model.is_skinned());
        let v = model.vertex(1).unwrap();
        assert_eq!(v.tangent, Some(Vec3::X));
        assert_eq!(v.joints, None);
    }

    #[test_case(MaterialLayout::Flagged ; "flagged")]
    #[test_case(MaterialLayout::Legacy ; "legacy")]
    fn test_parse_written_model(layout: MaterialLayout) {
        let mut model = triangle_model(VertexFlags::all());
        let mut data = Vec::new();
        model.write(&mut data, layout).unwrap();

        let options = DecodeOptions {
            material_layout: layout,
        };
        let parsed = ModelData::parse(&mut Cursor::new(data), "triangle", &options).unwrap();

        if layout == MaterialLayout::Legacy {
            // The legacy layout has nowhere to store flags
            for m in &mut model.materials {
                m.flags = MaterialFlags::empty();
            }
        }
        assert_eq!(parsed, model);
        assert_eq!(parsed.vertices().count(), 3);
        assert_eq!(parsed.vertex(2).unwrap(), vertex(2.0));
        assert_eq!(parsed.vertex(3), None);
    }

    #[test]
    fn test_vertex_index_past_address_space() {
        let model = triangle_model(VertexFlags::empty());
        assert_eq!(model.vertex(usize::MAX / 32), None);
        assert_eq!(model.vertex(usize::MAX), None);
    }

    #[test]
    fn test_truncated_vertex_buffer() {
        let model = triangle_model(VertexFlags::all());
        let mut data = Vec::new();
        model.write(&mut data, MaterialLayout::Flagged).unwrap();
        data.truncate(ModelHeader::SIZE as usize + 2 * 12 + 64);

        let err = ModelData::parse(&mut Cursor::new(data), "triangle", &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnimError::TruncatedStream { .. }));
    }

    #[test]
    fn test_partition_opaque_first() {
        let mut model = triangle_model(VertexFlags::empty());
        model.partition_opaque_first();
        assert_eq!(model.meshes[0].material_index, 0);
        assert_eq!(model.meshes[1].material_index, 1);
    }

    #[test]
    fn test_validate() {
        let mut model = triangle_model(VertexFlags::all());
        assert!(model.validate().is_ok());
        assert!(model.validate_joint_indices(2).is_ok());
        assert!(model.validate_joint_indices(1).is_err());

        model.indices[4] = 9;
        assert!(model.validate().is_err());

        let mut model = triangle_model(VertexFlags::all());
        model.meshes[0].material_index = 5;
        assert!(model.validate().is_err());

        let mut model = triangle_model(VertexFlags::all());
        model.meshes[1].index_end = 6;
        assert!(model.validate().is_err());
    }
}
