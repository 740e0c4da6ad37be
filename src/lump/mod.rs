mod defer;

pub(crate) use defer::DeferredWrites;

use binrw::{BinRead, BinWrite};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The 64 positionally-indexed byte regions a BSP file's directory
/// describes (spec.md §3 `LumpId`). Several index numbers have multiple
/// historical names; [`LumpId::from_alias`] resolves any of them to the
/// canonical variant used for lookups elsewhere in this crate.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum LumpId {
    Entities = 0,
    Planes = 1,
    TexData = 2,
    Vertexes = 3,
    Visibility = 4,
    Nodes = 5,
    TexInfo = 6,
    Faces = 7,
    Lighting = 8,
    Occlusion = 9,
    Leafs = 10,
    FaceIds = 11,
    Edges = 12,
    SurfEdges = 13,
    Models = 14,
    WorldLights = 15,
    LeafFaces = 16,
    LeafBrushes = 17,
    Brushes = 18,
    BrushSides = 19,
    Areas = 20,
    AreaPortals = 21,
    Portals = 22,
    Clusters = 23,
    PortalVerts = 24,
    ClusterPortals = 25,
    DispInfo = 26,
    OriginalFaces = 27,
    PhysDisp = 28,
    PhysCollide = 29,
    VertNormals = 30,
    VertNormalIndices = 31,
    DispLightmapAlphas = 32,
    DispVerts = 33,
    DispLightmapSamplePositions = 34,
    GameLump = 35,
    LeafWaterData = 36,
    Primitives = 37,
    PrimVerts = 38,
    PrimIndices = 39,
    PakFile = 40,
    ClipPortalVerts = 41,
    CubeMaps = 42,
    TexDataStringData = 43,
    TexDataStringTable = 44,
    Overlays = 45,
    LeafMinDistToWater = 46,
    FaceMacroTextureInfo = 47,
    DispTris = 48,
    PhysCollideSurface = 49,
    WaterOverlays = 50,
    LightmapPages = 51,
    LightmapPageInfos = 52,
    LightingHdr = 53,
    WorldLightsHdr = 54,
    LeafAmbientLightingHdr = 55,
    LeafAmbientLighting = 56,
    XZipPakFile = 57,
    FacesHdr = 58,
    MapFlags = 59,
    OverlayFades = 60,
    OverlaySystemLevels = 61,
    PhysLevel = 62,
    DispMultiBlend = 63,
}

pub const LUMP_COUNT: usize = 64;

static_assertions::const_assert_eq!(LumpId::DispMultiBlend as u8, 63);

impl LumpId {
    /// All 64 lumps, in directory (numeric) order.
    pub fn all() -> [LumpId; LUMP_COUNT] {
        std::array::from_fn(|i| LumpId::try_from(i as u8).unwrap())
    }

    /// Resolve any of a lump's historical aliases (spec.md §3) to its
    /// canonical variant. Aliases are user-facing lookup only; internal
    /// keying always uses the canonical name.
    pub fn from_alias(name: &str) -> Option<LumpId> {
        use LumpId::*;
        Some(match name {
            "ENTITIES" => Entities,
            "PLANES" => Planes,
            "TEXDATA" => TexData,
            "VERTEXES" => Vertexes,
            "VISIBILITY" => Visibility,
            "NODES" => Nodes,
            "TEXINFO" => TexInfo,
            "FACES" => Faces,
            "LIGHTING" => Lighting,
            "OCCLUSION" => Occlusion,
            "LEAFS" => Leafs,
            "FACEIDS" => FaceIds,
            "EDGES" => Edges,
            "SURFEDGES" => SurfEdges,
            "MODELS" => Models,
            "WORLDLIGHTS" => WorldLights,
            "LEAFFACES" => LeafFaces,
            "LEAFBRUSHES" => LeafBrushes,
            "BRUSHES" => Brushes,
            "BRUSHSIDES" => BrushSides,
            "AREAS" => Areas,
            "AREAPORTALS" => AreaPortals,
            "PORTALS" | "UNUSED0" | "PROPCOLLISION" => Portals,
            "CLUSTERS" | "UNUSED1" | "PROPHULLS" => Clusters,
            "PORTALVERTS" | "UNUSED2" | "PROPHULLVERTS" => PortalVerts,
            "CLUSTERPORTALS" | "UNUSED3" | "PROPTRIS" => ClusterPortals,
            "DISPINFO" => DispInfo,
            "ORIGINALFACES" => OriginalFaces,
            "PHYSDISP" => PhysDisp,
            "PHYSCOLLIDE" => PhysCollide,
            "VERTNORMALS" => VertNormals,
            "VERTNORMALINDICES" => VertNormalIndices,
            "DISP_LIGHTMAP_ALPHAS" => DispLightmapAlphas,
            "DISP_VERTS" => DispVerts,
            "DISP_LIGHTMAP_SAMPLE_POSITIONS" => DispLightmapSamplePositions,
            "GAME_LUMP" => GameLump,
            "LEAFWATERDATA" => LeafWaterData,
            "PRIMITIVES" => Primitives,
            "PRIMVERTS" => PrimVerts,
            "PRIMINDICES" => PrimIndices,
            "PAKFILE" => PakFile,
            "CLIPPORTALVERTS" => ClipPortalVerts,
            "CUBEMAPS" => CubeMaps,
            "TEXDATA_STRING_DATA" => TexDataStringData,
            "TEXDATA_STRING_TABLE" => TexDataStringTable,
            "OVERLAYS" => Overlays,
            "LEAFMINDISTTOWATER" => LeafMinDistToWater,
            "FACE_MACRO_TEXTURE_INFO" => FaceMacroTextureInfo,
            "DISP_TRIS" => DispTris,
            "PHYSCOLLIDESURFACE" | "PROP_BLOB" => PhysCollideSurface,
            "WATEROVERLAYS" => WaterOverlays,
            "LIGHTMAPPAGES" | "LEAF_AMBIENT_INDEX_HDR" => LightmapPages,
            "LIGHTMAPPAGEINFOS" | "LEAF_AMBIENT_INDEX" => LightmapPageInfos,
            "LIGHTING_HDR" => LightingHdr,
            "WORLDLIGHTS_HDR" => WorldLightsHdr,
            "LEAF_AMBIENT_LIGHTING_HDR" => LeafAmbientLightingHdr,
            "LEAF_AMBIENT_LIGHTING" => LeafAmbientLighting,
            "XZIPPAKFILE" => XZipPakFile,
            "FACES_HDR" => FacesHdr,
            "MAP_FLAGS" => MapFlags,
            "OVERLAY_FADES" => OverlayFades,
            "OVERLAY_SYSTEM_LEVELS" => OverlaySystemLevels,
            "PHYSLEVEL" => PhysLevel,
            "DISP_MULTIBLEND" => DispMultiBlend,
            _ => return None,
        })
    }
}

/// One lump's header fields plus its raw byte payload (spec.md §3 `Lump`).
/// Most lumps are carried as opaque bytes; only the five lumps covered by
/// this crate's dedicated codecs have their contents interpreted.
#[derive(Debug, Clone)]
pub struct Lump {
    pub r#type: LumpId,
    pub version: i32,
    pub ident: [u8; 4],
    pub data: Vec<u8>,
}

impl Lump {
    pub(crate) fn empty(r#type: LumpId) -> Self {
        Lump {
            r#type,
            version: 0,
            ident: [0; 4],
            data: Vec::new(),
        }
    }
}

/// The fixed 16-byte on-disk shape of one directory entry (spec.md §4.1).
/// `offset`/`length` are written as placeholders and back-patched by
/// [`DeferredWrites`] once each lump's payload position is known.
#[derive(Debug, Clone, Copy, BinRead, BinWrite)]
#[brw(little)]
pub(crate) struct DirectoryEntry {
    pub offset: i32,
    pub length: i32,
    pub version: i32,
    pub ident: [u8; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_aliases_resolve() {
        assert_eq!(LumpId::from_alias("UNUSED0"), Some(LumpId::Portals));
        assert_eq!(LumpId::from_alias("PROPCOLLISION"), Some(LumpId::Portals));
        assert_eq!(LumpId::from_alias("NOPE"), None);
    }

    #[test]
    fn all_64_lumps_present_in_order() {
        let all = LumpId::all();
        assert_eq!(all.len(), 64);
        for (i, lump) in all.iter().enumerate() {
            assert_eq!(*lump as u8, i as u8);
        }
    }
}
