use crate::error::{BspError, ValidationError};
use crate::math::Vector;
use binrw::{BinRead, BinReaderExt};

/// A single splitting plane: unit normal plus signed distance from the
/// origin. The on-disk `type` field (which axis the normal is closest to)
/// is informational only and is not kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector,
    pub distance: f32,
}

#[derive(Debug, BinRead)]
#[br(little)]
struct RawPlane {
    nx: f32,
    ny: f32,
    nz: f32,
    dist: f32,
    // Informational only (spec.md §4.6); kept as a plain field rather than
    // `#[br(temp)]` since that directive needs the `#[binread]` attribute
    // macro, not `#[derive(BinRead)]`.
    _plane_type: i32,
}

#[derive(Debug, BinRead)]
#[br(little)]
struct RawNode {
    plane_index: i32,
    neg_child: i32,
    pos_child: i32,
    min: [i16; 3],
    max: [i16; 3],
    first_face: u16,
    face_count: u16,
    area: i16,
    _pad: i16,
}

#[derive(Debug, BinRead)]
#[br(little)]
struct RawLeaf {
    contents: i32,
    cluster: i16,
    area_and_flags: u16,
    min: [i16; 3],
    max: [i16; 3],
    first_face: u16,
    face_count: u16,
    first_brush: u16,
    brush_count: u16,
    water: i16,
    _pad: i16,
}

/// A reference to either a child node or a leaf, resolved from a node's
/// signed child index (spec.md §4.6 sentinel rule: negative means leaf
/// `-1 - c`, non-negative means node `c`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Node(usize),
    Leaf(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub plane: usize,
    pub children: [NodeRef; 2],
    pub min: [i16; 3],
    pub max: [i16; 3],
    pub first_face: u16,
    pub face_count: u16,
    pub area: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisLeaf {
    pub contents: i32,
    pub cluster: i16,
    pub area: u16,
    pub flags: u8,
    pub min: [i16; 3],
    pub max: [i16; 3],
    pub first_face: u16,
    pub face_count: u16,
    pub first_brush: u16,
    pub brush_count: u16,
    pub water: i16,
}

/// The reconstructed BSP visibility tree: a DAG of nodes and leaves stored
/// as an arena of indices rather than reference-counted pointers, since
/// sibling nodes routinely share leaves (spec.md §9 Design Notes).
#[derive(Debug, Clone, PartialEq)]
pub struct VisTree {
    pub planes: Vec<Plane>,
    pub nodes: Vec<TreeNode>,
    pub leaves: Vec<VisLeaf>,
    pub root: usize,
}

impl VisTree {
    /// `file_version` is the containing `BspFile`'s header version; at
    /// version <= 19 each leaf record carries 26 extra trailing bytes of
    /// ambient-light data that this crate does not interpret.
    pub fn build(
        planes_data: &[u8],
        nodes_data: &[u8],
        leafs_data: &[u8],
        file_version: i32,
    ) -> Result<VisTree, BspError> {
        const PLANE_LEN: usize = 20;
        let mut planes = Vec::with_capacity(planes_data.len() / PLANE_LEN);
        {
            let mut cursor = binrw::io::Cursor::new(planes_data);
            for _ in 0..(planes_data.len() / PLANE_LEN) {
                let raw: RawPlane = cursor.read_le()?;
                planes.push(Plane {
                    normal: Vector::new(raw.nx as f64, raw.ny as f64, raw.nz as f64),
                    distance: raw.dist,
                });
            }
        }

        const NODE_LEN: usize = 32;
        let mut raw_nodes = Vec::with_capacity(nodes_data.len() / NODE_LEN);
        {
            let mut cursor = binrw::io::Cursor::new(nodes_data);
            for _ in 0..(nodes_data.len() / NODE_LEN) {
                raw_nodes.push(cursor.read_le::<RawNode>()?);
            }
        }
        let leaf_record_len = if file_version <= 19 { 32 + 26 } else { 32 };
        let leaf_count = leafs_data.len() / leaf_record_len;
        let mut leaves = Vec::with_capacity(leaf_count);
        let mut cursor = binrw::io::Cursor::new(leafs_data);
        for _ in 0..leaf_count {
            let raw: RawLeaf = cursor.read_le()?;
            if file_version <= 19 {
                let mut skip = [0u8; 26];
                std::io::Read::read_exact(&mut cursor, &mut skip)?;
            }
            leaves.push(VisLeaf {
                contents: raw.contents,
                cluster: raw.cluster,
                area: raw.area_and_flags >> 7,
                flags: (raw.area_and_flags & 0x7F) as u8,
                min: raw.min,
                max: raw.max,
                first_face: raw.first_face,
                face_count: raw.face_count,
                first_brush: raw.first_brush,
                brush_count: raw.brush_count,
                water: raw.water,
            });
        }

        let mut nodes = Vec::with_capacity(raw_nodes.len());
        for raw in &raw_nodes {
            let plane = validate_index("node", "plane", raw.plane_index, planes.len())?;
            let neg = resolve_child(raw.neg_child, raw_nodes.len(), leaves.len())?;
            let pos = resolve_child(raw.pos_child, raw_nodes.len(), leaves.len())?;
            nodes.push(TreeNode {
                plane,
                children: [neg, pos],
                min: raw.min,
                max: raw.max,
                first_face: raw.first_face,
                face_count: raw.face_count,
                area: raw.area,
            });
        }

        if nodes.is_empty() {
            return Err(ValidationError::NoRootNode.into());
        }

        Ok(VisTree {
            planes,
            nodes,
            leaves,
            root: 0,
        })
    }
}

fn resolve_child(c: i32, node_count: usize, leaf_count: usize) -> Result<NodeRef, BspError> {
    if c < 0 {
        let leaf = -1 - c;
        validate_index("node child", "leaf", leaf, leaf_count).map(NodeRef::Leaf)
    } else {
        validate_index("node child", "node", c, node_count).map(NodeRef::Node)
    }
}

fn validate_index(
    from_kind: &'static str,
    target: &'static str,
    index: i32,
    size: usize,
) -> Result<usize, BspError> {
    if index < 0 || index as usize >= size {
        return Err(ValidationError::ReferenceOutOfRange {
            from_kind,
            target,
            index: index as i64,
            size,
        }
        .into());
    }
    Ok(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_bytes(nx: f32, ny: f32, nz: f32, dist: f32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&nx.to_le_bytes());
        out.extend_from_slice(&ny.to_le_bytes());
        out.extend_from_slice(&nz.to_le_bytes());
        out.extend_from_slice(&dist.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out
    }

    fn node_bytes(plane_index: i32, neg_child: i32, pos_child: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&plane_index.to_le_bytes());
        out.extend_from_slice(&neg_child.to_le_bytes());
        out.extend_from_slice(&pos_child.to_le_bytes());
        for _ in 0..6 {
            out.extend_from_slice(&0i16.to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out
    }

    fn leaf_bytes(area_and_flags: u16, extra: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&area_and_flags.to_le_bytes());
        for _ in 0..6 {
            out.extend_from_slice(&0i16.to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&0i16.to_le_bytes());
        if extra {
            out.extend_from_slice(&[0u8; 26]);
        }
        out
    }

    #[test]
    fn single_node_two_leaves() {
        let planes = plane_bytes(1.0, 0.0, 0.0, 0.0);
        let nodes = node_bytes(0, -1, -2);
        let mut leafs = leaf_bytes(0, false);
        leafs.extend_from_slice(&leaf_bytes(0, false));

        let tree = VisTree::build(&planes, &nodes, &leafs, 20).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.leaves.len(), 2);
        assert_eq!(tree.nodes[0].children, [NodeRef::Leaf(0), NodeRef::Leaf(1)]);
        assert_eq!(tree.root, 0);
    }

    #[test]
    fn old_file_version_skips_ambient_bytes() {
        let planes = plane_bytes(0.0, 0.0, 1.0, 10.0);
        let nodes = node_bytes(0, -1, -1);
        let leafs = leaf_bytes(0, true);
        let tree = VisTree::build(&planes, &nodes, &leafs, 19).unwrap();
        assert_eq!(tree.leaves.len(), 1);
    }

    #[test]
    fn area_and_flags_split() {
        let planes = plane_bytes(1.0, 0.0, 0.0, 0.0);
        let nodes = node_bytes(0, -1, -1);
        let area_and_flags = (3u16 << 7) | 0b0101010;
        let leafs = leaf_bytes(area_and_flags, false);
        let tree = VisTree::build(&planes, &nodes, &leafs, 20).unwrap();
        assert_eq!(tree.leaves[0].area, 3);
        assert_eq!(tree.leaves[0].flags, 0b0101010);
    }

    #[test]
    fn out_of_range_plane_index_is_rejected() {
        let planes = plane_bytes(1.0, 0.0, 0.0, 0.0);
        let nodes = node_bytes(5, -1, -1);
        let leafs = leaf_bytes(0, false);
        assert!(VisTree::build(&planes, &nodes, &leafs, 20).is_err());
    }
}
