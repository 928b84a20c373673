// Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::{
    borrow::Cow,
    fmt::{self, Display},
    str::FromStr,
};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    Direction,
    math::{AABB, Vector2, Vector3},
};

// A chunk position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos(pub Vector2<i32>);

impl ChunkPos {
    /// Creates a chunk position from chunk coordinates.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The chunk x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The chunk z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }
}

// A block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// Offsets the position by the given amounts.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// The neighbouring position in `direction`.
    #[must_use]
    pub const fn relative(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        self.offset(dx, dy, dz)
    }

    /// The position directly above.
    #[must_use]
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The position directly below.
    #[must_use]
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The chunk this position lives in.
    #[must_use]
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(self.0.x >> 4, self.0.z >> 4)
    }

    /// The center of the block in world space.
    #[must_use]
    pub fn center(self) -> Vector3<f64> {
        Vector3::new(
            f64::from(self.0.x) + 0.5,
            f64::from(self.0.y) + 0.5,
            f64::from(self.0.z) + 0.5,
        )
    }

    /// The block containing the given world space point.
    #[must_use]
    pub fn containing(point: Vector3<f64>) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    /// The unit box occupying this block.
    #[must_use]
    pub fn bounding_box(self) -> AABB {
        let min = Vector3::new(
            f64::from(self.0.x),
            f64::from(self.0.y),
            f64::from(self.0.z),
        );
        AABB::new(min, min + Vector3::new(1.0, 1.0, 1.0))
    }

    /// Squared distance between the block center and a point.
    #[must_use]
    pub fn dist_to_center_sqr(self, point: Vector3<f64>) -> f64 {
        let center = self.center();
        let (dx, dy, dz) = (center.x - point.x, center.y - point.y, center.z - point.z);
        dx * dx + dy * dy + dz * dz
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0.x, self.0.y, self.0.z)
    }
}

bitflags! {
    /// Flags controlling the side effects of a block change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: u8 {
        /// Notify the six neighbours of the change.
        const UPDATE_NEIGHBORS = 1;
        /// Send the change to clients.
        const UPDATE_CLIENTS = 2;
        /// Skip the `on_place` hook of the new block.
        const UPDATE_SKIP_ON_PLACE = 4;
        /// Don't drop container contents when a block entity is destroyed.
        const UPDATE_SUPPRESS_DROPS = 8;
        /// The default for gameplay changes.
        const UPDATE_ALL = Self::UPDATE_NEIGHBORS.bits() | Self::UPDATE_CLIENTS.bits();
    }
}

/// A namespaced identifier such as `minecraft:hopper`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    /// The namespace, `minecraft` for vanilla content.
    pub namespace: Cow<'static, str>,
    /// The path within the namespace.
    pub path: Cow<'static, str>,
}

impl Identifier {
    /// The namespace used by vanilla content.
    pub const VANILLA_NAMESPACE: &'static str = "minecraft";

    /// Creates a vanilla identifier from an owned path.
    #[must_use]
    pub fn vanilla(path: String) -> Self {
        Identifier {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Owned(path),
        }
    }

    /// Creates a vanilla identifier in const context.
    #[must_use]
    pub const fn vanilla_static(path: &'static str) -> Self {
        Identifier {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Borrowed(path),
        }
    }

    fn valid_namespace_char(namespace_char: char) -> bool {
        namespace_char == '_'
            || namespace_char == '-'
            || namespace_char.is_ascii_lowercase()
            || namespace_char.is_ascii_digit()
            || namespace_char == '.'
    }

    fn valid_path_char(path_char: char) -> bool {
        Self::valid_namespace_char(path_char) || path_char == '/'
    }

    /// Whether every character of `namespace` is allowed.
    #[must_use]
    pub fn validate_namespace(namespace: &str) -> bool {
        !namespace.is_empty() && namespace.chars().all(Self::valid_namespace_char)
    }

    /// Whether every character of `path` is allowed.
    #[must_use]
    pub fn validate_path(path: &str) -> bool {
        !path.is_empty() && path.chars().all(Self::valid_path_char)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = String;

    /// Parses `namespace:path`. A bare path is read as a vanilla identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = s.split_once(':').unwrap_or((Self::VANILLA_NAMESPACE, s));

        if !Identifier::validate_namespace(namespace) {
            return Err(format!("Invalid namespace: {namespace}"));
        }

        if !Identifier::validate_path(path) {
            return Err(format!("Invalid path: {path}"));
        }

        Ok(Identifier {
            namespace: Cow::Owned(namespace.to_string()),
            path: Cow::Owned(path.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_parse() {
        let id: Identifier = "minecraft:hopper".parse().expect("valid identifier");
        assert_eq!(id, Identifier::vanilla_static("hopper"));

        let bare: Identifier = "chest".parse().expect("bare path is vanilla");
        assert_eq!(bare.to_string(), "minecraft:chest");

        assert!("Minecraft:hopper".parse::<Identifier>().is_err());
        assert!("minecraft:".parse::<Identifier>().is_err());
    }

    #[test]
    fn test_block_pos_chunk() {
        assert_eq!(BlockPos::new(15, 64, 16).chunk_pos(), ChunkPos::new(0, 1));
        assert_eq!(BlockPos::new(-1, 0, -17).chunk_pos(), ChunkPos::new(-1, -2));
    }

    #[test]
    fn test_relative() {
        let pos = BlockPos::new(0, 64, 0);
        assert_eq!(pos.relative(Direction::Down), BlockPos::new(0, 63, 0));
        assert_eq!(pos.relative(Direction::East), BlockPos::new(1, 64, 0));
    }
}
