use crate::error::BspError;
use crate::math::{Angle, Vector};
use arrayvec::ArrayString;
use binrw::{BinRead, BinReaderExt, BinWrite};
use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The solidity of a static prop's collision hull.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum SolidType {
    None = 0,
    Bsp = 1,
    Bbox = 2,
    Obb = 3,
    ObbYaw = 4,
    Custom = 5,
    VPhysics = 6,
    Last = 7,
}

bitflags! {
    /// Rendering/behavior flags for a static prop. The low byte is always
    /// present (`flags_low` in spec.md §4.4); the high bits are only
    /// written/read on game-lump version >= 10 (`flags_high`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StaticPropFlags: u32 {
        const FADES                   = 0x0001;
        const USE_LIGHTING_ORIGIN     = 0x0002;
        const NO_DRAW                 = 0x0004;
        const IGNORE_NORMALS          = 0x0008;
        const NO_SHADOW                = 0x0010;
        const SCREEN_SPACE_FADE        = 0x0020;
        const NO_PER_VERTEX_LIGHTING   = 0x0040;
        const NO_SELF_SHADOWING        = 0x0080;
        const NO_FLASHLIGHT             = 0x0100;
        const BOUNCED_LIGHTING          = 0x0400;
    }
}

/// One decoded static prop instance (spec.md §4.4). Fields that only exist
/// on some game-lump versions are always present here, defaulted to the
/// values `original_source/srctools/bsp.py` uses when a version doesn't
/// carry them, so that editing a prop never depends on which version it
/// happened to be parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticProp {
    pub origin: Vector,
    pub angles: Angle,
    pub model: String,
    pub visleafs: Vec<u16>,
    pub solidity: SolidType,
    pub flags: StaticPropFlags,
    pub skin: i32,
    pub fade_min_dist: f32,
    pub fade_max_dist: f32,
    pub lighting_origin: Vector,
    pub fade_scale: f32,
    pub min_dx_level: u16,
    pub max_dx_level: u16,
    pub min_cpu_level: u8,
    pub max_cpu_level: u8,
    pub min_gpu_level: u8,
    pub max_gpu_level: u8,
    pub tint: (u8, u8, u8),
    pub render_fx: u8,
    pub disable_on_xbox: bool,
    pub scaling: f32,
}

const MODEL_NAME_LEN: usize = 128;

/// The decoded `sprp` game lump: every static prop, plus the version of the
/// record layout they were read from (and will be written back out as).
#[derive(Debug, Clone)]
pub struct StaticPropLump {
    pub version: u16,
    pub props: Vec<StaticProp>,
}

impl StaticPropLump {
    pub fn parse(version: u16, data: &[u8]) -> Result<StaticPropLump, BspError> {
        if !(4..=11).contains(&version) {
            return Err(BspError::UnsupportedStaticPropVersion(version));
        }

        let mut cursor = binrw::io::Cursor::new(data);

        let model_count: i32 = cursor.read_le()?;
        let mut models = Vec::with_capacity(model_count.max(0) as usize);
        for _ in 0..model_count {
            let mut raw = [0u8; MODEL_NAME_LEN];
            std::io::Read::read_exact(&mut cursor, &mut raw)?;
            models.push(decode_fixed_string(&raw));
        }

        let leaf_count: i32 = cursor.read_le()?;
        let mut leaves = Vec::with_capacity(leaf_count.max(0) as usize);
        for _ in 0..leaf_count {
            leaves.push(cursor.read_le::<u16>()?);
        }

        let prop_count: i32 = cursor.read_le()?;
        let mut props = Vec::with_capacity(prop_count.max(0) as usize);
        for _ in 0..prop_count {
            props.push(read_prop(&mut cursor, version, &models, &leaves)?);
        }

        Ok(StaticPropLump { version, props })
    }

    pub fn write(&self) -> Result<Vec<u8>, BspError> {
        use itertools::Itertools;

        let version = self.version;

        let model_names: Vec<String> = self.props.iter().map(|p| p.model.clone()).unique().collect();
        let model_index: std::collections::HashMap<&str, u16> = model_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i as u16))
            .collect();

        let mut leaf_table: Vec<u16> = Vec::new();
        let mut leaf_ranges = Vec::with_capacity(self.props.len());
        for prop in &self.props {
            let start = leaf_table.len();
            leaf_table.extend_from_slice(&prop.visleafs);
            leaf_ranges.push((start as u16, prop.visleafs.len() as u16));
        }

        let mut out = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut out);

        (model_names.len() as i32).write_le(&mut cursor)?;
        for name in &model_names {
            std::io::Write::write_all(&mut cursor, &encode_fixed_string(name)?)?;
        }

        (leaf_table.len() as i32).write_le(&mut cursor)?;
        for leaf in &leaf_table {
            (*leaf).write_le(&mut cursor)?;
        }

        (self.props.len() as i32).write_le(&mut cursor)?;
        for (prop, (first_leaf, leaf_count)) in self.props.iter().zip(leaf_ranges) {
            let model_idx = *model_index.get(prop.model.as_str()).unwrap();
            write_prop(&mut cursor, version, prop, model_idx, first_leaf, leaf_count)?;
        }

        Ok(out)
    }
}

fn decode_fixed_string(raw: &[u8; MODEL_NAME_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn encode_fixed_string(s: &str) -> Result<[u8; MODEL_NAME_LEN], BspError> {
    let mut fixed = ArrayString::<MODEL_NAME_LEN>::new();
    for byte in s.bytes().take(MODEL_NAME_LEN - 1) {
        let _ = fixed.try_push(byte as char);
    }
    let mut raw = [0u8; MODEL_NAME_LEN];
    raw[..fixed.len()].copy_from_slice(fixed.as_bytes());
    Ok(raw)
}

fn read_prop(
    cursor: &mut binrw::io::Cursor<&[u8]>,
    version: u16,
    models: &[String],
    leaves: &[u16],
) -> Result<StaticProp, BspError> {
    let origin = read_vector(cursor)?;
    let angles = read_angle(cursor)?;
    let model_index: u16 = cursor.read_le()?;
    let first_leaf: u16 = cursor.read_le()?;
    let leaf_count: u16 = cursor.read_le()?;
    let solidity_byte: u8 = cursor.read_le()?;
    let solidity = SolidType::try_from(solidity_byte)
        .map_err(|_| BspError::InvalidSolidType(solidity_byte))?;
    let flags_low: u8 = cursor.read_le()?;
    let skin: i32 = cursor.read_le()?;
    let fade_min_dist: f32 = cursor.read_le()?;
    let fade_max_dist: f32 = cursor.read_le()?;
    let lighting_origin = read_vector(cursor)?;

    let fade_scale: f32 = if version >= 5 { cursor.read_le()? } else { 1.0 };

    let (min_dx_level, max_dx_level) = if (6..=7).contains(&version) {
        (cursor.read_le()?, cursor.read_le()?)
    } else {
        (0, 0)
    };

    let (min_cpu_level, max_cpu_level, min_gpu_level, max_gpu_level) = if version >= 8 {
        (
            cursor.read_le()?,
            cursor.read_le()?,
            cursor.read_le()?,
            cursor.read_le()?,
        )
    } else {
        (0, 0, 0, 0)
    };

    let (tint, render_fx) = if version >= 7 {
        let r = cursor.read_le()?;
        let g = cursor.read_le()?;
        let b = cursor.read_le()?;
        let fx = cursor.read_le()?;
        ((r, g, b), fx)
    } else {
        ((255, 255, 255), 255)
    };

    if version >= 11 {
        let _unknown_extra_data: i32 = cursor.read_le()?;
    }

    let mut flags = StaticPropFlags::from_bits_truncate(flags_low as u32);
    if version >= 10 {
        let flags_high: u32 = cursor.read_le()?;
        flags = StaticPropFlags::from_bits_truncate(flags.bits() | (flags_high << 8));
    }

    let scaling = if version >= 11 {
        let mut pad = [0u8; 4];
        std::io::Read::read_exact(cursor, &mut pad)?;
        cursor.read_le()?
    } else {
        1.0
    };

    let disable_on_xbox = if (9..=10).contains(&version) {
        let v: u8 = cursor.read_le()?;
        let mut pad = [0u8; 3];
        std::io::Read::read_exact(cursor, &mut pad)?;
        v != 0
    } else {
        false
    };

    let model = models
        .get(model_index as usize)
        .cloned()
        .unwrap_or_default();
    let start = first_leaf as usize;
    let end = start + leaf_count as usize;
    let visleafs = leaves.get(start..end).map(|s| s.to_vec()).unwrap_or_default();

    Ok(StaticProp {
        origin,
        angles,
        model,
        visleafs,
        solidity,
        flags,
        skin,
        fade_min_dist,
        fade_max_dist,
        lighting_origin,
        fade_scale,
        min_dx_level,
        max_dx_level,
        min_cpu_level,
        max_cpu_level,
        min_gpu_level,
        max_gpu_level,
        tint,
        render_fx,
        disable_on_xbox,
        scaling,
    })
}

fn write_prop<W: std::io::Write + std::io::Seek>(
    writer: &mut W,
    version: u16,
    prop: &StaticProp,
    model_index: u16,
    first_leaf: u16,
    leaf_count: u16,
) -> Result<(), BspError> {
    write_vector(writer, prop.origin)?;
    write_angle(writer, prop.angles)?;
    model_index.write_le(writer)?;
    first_leaf.write_le(writer)?;
    leaf_count.write_le(writer)?;
    (prop.solidity as u8).write_le(writer)?;
    ((prop.flags.bits() & 0xFF) as u8).write_le(writer)?;
    prop.skin.write_le(writer)?;
    prop.fade_min_dist.write_le(writer)?;
    prop.fade_max_dist.write_le(writer)?;
    write_vector(writer, prop.lighting_origin)?;

    if version >= 5 {
        prop.fade_scale.write_le(writer)?;
    }

    if (6..=7).contains(&version) {
        prop.min_dx_level.write_le(writer)?;
        prop.max_dx_level.write_le(writer)?;
    }

    if version >= 8 {
        prop.min_cpu_level.write_le(writer)?;
        prop.max_cpu_level.write_le(writer)?;
        prop.min_gpu_level.write_le(writer)?;
        prop.max_gpu_level.write_le(writer)?;
    }

    if version >= 7 {
        prop.tint.0.write_le(writer)?;
        prop.tint.1.write_le(writer)?;
        prop.tint.2.write_le(writer)?;
        prop.render_fx.write_le(writer)?;
    }

    if version >= 11 {
        0i32.write_le(writer)?;
    }

    if version >= 10 {
        (prop.flags.bits() >> 8).write_le(writer)?;
    }

    if version >= 11 {
        [0u8; 4].write_le(writer)?;
        prop.scaling.write_le(writer)?;
    }

    if (9..=10).contains(&version) {
        (prop.disable_on_xbox as u8).write_le(writer)?;
        [0u8; 3].write_le(writer)?;
    }

    Ok(())
}

fn read_vector(cursor: &mut binrw::io::Cursor<&[u8]>) -> Result<Vector, BspError> {
    let x: f32 = cursor.read_le()?;
    let y: f32 = cursor.read_le()?;
    let z: f32 = cursor.read_le()?;
    Ok(Vector::new(x as f64, y as f64, z as f64))
}

fn write_vector<W: std::io::Write + std::io::Seek>(
    writer: &mut W,
    v: Vector,
) -> Result<(), BspError> {
    (v.x as f32).write_le(writer)?;
    (v.y as f32).write_le(writer)?;
    (v.z as f32).write_le(writer)?;
    Ok(())
}

fn read_angle(cursor: &mut binrw::io::Cursor<&[u8]>) -> Result<Angle, BspError> {
    let pitch: f32 = cursor.read_le()?;
    let yaw: f32 = cursor.read_le()?;
    let roll: f32 = cursor.read_le()?;
    Ok(Angle::new(pitch as f64, yaw as f64, roll as f64))
}

fn write_angle<W: std::io::Write + std::io::Seek>(
    writer: &mut W,
    a: Angle,
) -> Result<(), BspError> {
    let (pitch, yaw, roll) = a.as_tuple();
    (pitch as f32).write_le(writer)?;
    (yaw as f32).write_le(writer)?;
    (roll as f32).write_le(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_prop(model: &str) -> StaticProp {
        StaticProp {
            origin: Vector::new(1.0, 2.0, 3.0),
            angles: Angle::new(0.0, 90.0, 0.0),
            model: model.to_string(),
            visleafs: vec![4, 5, 6],
            solidity: SolidType::Bsp,
            flags: StaticPropFlags::FADES | StaticPropFlags::NO_SHADOW,
            skin: 0,
            fade_min_dist: 100.0,
            fade_max_dist: 2000.0,
            lighting_origin: Vector::new(0.0, 0.0, 0.0),
            fade_scale: 1.0,
            min_dx_level: 0,
            max_dx_level: 0,
            min_cpu_level: 0,
            max_cpu_level: 0,
            min_gpu_level: 0,
            max_gpu_level: 0,
            tint: (255, 255, 255),
            render_fx: 255,
            disable_on_xbox: false,
            scaling: 1.0,
        }
    }

    #[test]
    fn round_trips_version_6() {
        let lump = StaticPropLump {
            version: 6,
            props: vec![sample_prop("props/foo.mdl")],
        };
        let bytes = lump.write().unwrap();
        let parsed = StaticPropLump::parse(6, &bytes).unwrap();
        assert_eq!(parsed.props.len(), 1);
        assert_eq!(parsed.props[0].model, "props/foo.mdl");
        assert_eq!(parsed.props[0].visleafs, vec![4, 5, 6]);
        assert_eq!(parsed.props[0].flags, sample_prop("x").flags);
    }

    #[test]
    fn round_trips_version_11_with_flags_high() {
        let mut prop = sample_prop("props/bar.mdl");
        prop.flags = StaticPropFlags::from_bits_truncate(0x1FF);
        let lump = StaticPropLump {
            version: 11,
            props: vec![prop],
        };
        let bytes = lump.write().unwrap();
        let parsed = StaticPropLump::parse(11, &bytes).unwrap();
        assert_eq!(parsed.props[0].flags.bits(), 0x1FF);
    }

    #[test]
    fn shared_model_names_deduplicate() {
        let lump = StaticPropLump {
            version: 4,
            props: vec![sample_prop("a.mdl"), sample_prop("a.mdl"), sample_prop("b.mdl")],
        };
        let bytes = lump.write().unwrap();
        // model_count i32 is the first four bytes; only 2 distinct names.
        let count = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(count, 2);
    }

    #[test]
    fn rejects_invalid_solidity_byte() {
        let mut data = Vec::new();
        data.extend_from_slice(&0i32.to_le_bytes()); // model_count
        data.extend_from_slice(&0i32.to_le_bytes()); // leaf_count
        data.extend_from_slice(&1i32.to_le_bytes()); // prop_count

        data.extend_from_slice(&[0u8; 12]); // origin
        data.extend_from_slice(&[0u8; 12]); // angles
        data.extend_from_slice(&0u16.to_le_bytes()); // model_index
        data.extend_from_slice(&0u16.to_le_bytes()); // first_leaf
        data.extend_from_slice(&0u16.to_le_bytes()); // leaf_count
        data.push(8); // solidity: out of SolidType's 0..=7 range
        data.push(0); // flags_low
        data.extend_from_slice(&0i32.to_le_bytes()); // skin
        data.extend_from_slice(&0f32.to_le_bytes()); // fade_min_dist
        data.extend_from_slice(&0f32.to_le_bytes()); // fade_max_dist
        data.extend_from_slice(&[0u8; 12]); // lighting_origin
        data.extend_from_slice(&0f32.to_le_bytes()); // fade_scale (v >= 5)
        data.extend_from_slice(&0u16.to_le_bytes()); // min_dx_level (v in 6..=7)
        data.extend_from_slice(&0u16.to_le_bytes()); // max_dx_level

        assert!(matches!(
            StaticPropLump::parse(6, &data),
            Err(BspError::InvalidSolidType(8))
        ));
    }

    #[test]
    fn accepts_last_solidity_variant() {
        assert_eq!(SolidType::try_from(7u8).unwrap(), SolidType::Last);
    }

    #[test]
    fn rejects_out_of_range_version() {
        assert!(matches!(
            StaticPropLump::parse(12, &[]),
            Err(BspError::UnsupportedStaticPropVersion(12))
        ));
        assert!(matches!(
            StaticPropLump::parse(3, &[]),
            Err(BspError::UnsupportedStaticPropVersion(3))
        ));
    }
}
