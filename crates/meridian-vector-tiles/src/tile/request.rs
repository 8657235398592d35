//! Parses an incoming tile path into a typed, validated request before any
//! I/O is attempted, and derives the cache fingerprint and TTL for it.
//!
//! The fingerprint format is `tile:<kind>[:<layer>]:<z>:<x>:<y>`, matching
//! what the single-flight cache keys its entries on.

use meridian_cache::TileKind;
use meridian_db::AdminLayer;

use crate::error::{Error, Result};

/// Highest zoom level this service will generate a tile for.
pub const MAX_ZOOM: u8 = 22;

/// A parsed, validated tile request: which table family, which admin
/// sub-layer (if any), and which ZXY coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRequest {
    kind: TileKind,
    admin_layer: Option<AdminLayer>,
    z: u8,
    x: u32,
    y: u32,
}

impl TileRequest {
    /// Parses a forest-tile request. `y` may carry a trailing `.mvt`.
    pub fn forest(z: &str, x: &str, y: &str) -> Result<Self> {
        Self::parse(TileKind::Forest, None, z, x, y)
    }

    /// Parses a cadastre-tile request. `y` may carry a trailing `.mvt`.
    pub fn cadastre(z: &str, x: &str, y: &str) -> Result<Self> {
        Self::parse(TileKind::Cadastre, None, z, x, y)
    }

    /// Parses an admin-boundary tile request. `layer` must match the
    /// [`AdminLayer`] allow-list or this fails with [`Error::LayerNotFound`].
    /// `y` may carry a trailing `.mvt`.
    pub fn admin(layer: &str, z: &str, x: &str, y: &str) -> Result<Self> {
        Self::parse(TileKind::Admin, Some(layer), z, x, y)
    }

    fn parse(kind: TileKind, sub_layer: Option<&str>, z: &str, x: &str, y: &str) -> Result<Self> {
        let admin_layer = match (kind, sub_layer) {
            (TileKind::Admin, Some(raw)) => Some(
                AdminLayer::parse(raw).ok_or_else(|| Error::LayerNotFound(raw.to_string()))?,
            ),
            (TileKind::Admin, None) => {
                return Err(Error::LayerNotFound("admin tile requires a layer".into()))
            }
            (_, None) => None,
            (_, Some(raw)) => {
                return Err(Error::InvalidCoordinate(format!(
                    "layer not applicable for this tile kind: {raw}"
                )))
            }
        };

        let y = y.strip_suffix(".mvt").unwrap_or(y);

        let z: u8 = z
            .parse()
            .map_err(|_| Error::InvalidCoordinate(format!("invalid zoom component: {z}")))?;
        let x: u32 = x
            .parse()
            .map_err(|_| Error::InvalidCoordinate(format!("invalid x component: {x}")))?;
        let y: u32 = y
            .parse()
            .map_err(|_| Error::InvalidCoordinate(format!("invalid y component: {y}")))?;

        if z > MAX_ZOOM {
            return Err(Error::InvalidZoom {
                zoom: z,
                min: 0,
                max: MAX_ZOOM,
            });
        }

        let span = 1u32 << z;
        if x >= span || y >= span {
            return Err(Error::InvalidCoordinate(format!(
                "({x}, {y}) out of range for zoom {z} (max {})",
                span - 1
            )));
        }

        Ok(Self {
            kind,
            admin_layer,
            z,
            x,
            y,
        })
    }

    /// The table family this request targets.
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    /// The admin sub-layer, if this is an admin-boundary request.
    pub fn admin_layer(&self) -> Option<AdminLayer> {
        self.admin_layer
    }

    /// The requested zoom level.
    pub fn z(&self) -> u8 {
        self.z
    }

    /// The requested tile column.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// The requested tile row.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// The cache TTL for this request's kind.
    pub fn ttl(&self) -> std::time::Duration {
        self.kind.ttl()
    }

    /// The cache fingerprint this request resolves to.
    pub fn fingerprint(&self) -> String {
        match self.admin_layer {
            Some(layer) => format!(
                "tile:{}:{}:{}:{}:{}",
                self.kind.fingerprint_segment(),
                layer.as_str(),
                self.z,
                self.x,
                self.y
            ),
            None => format!(
                "tile:{}:{}:{}:{}",
                self.kind.fingerprint_segment(),
                self.z,
                self.x,
                self.y
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_mvt_suffix_from_y() {
        let a = TileRequest::forest("10", "512", "384.mvt").unwrap();
        let b = TileRequest::forest("10", "512", "384").unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn rejects_zoom_above_max() {
        let err = TileRequest::forest("23", "0", "0").unwrap_err();
        assert!(matches!(err, Error::InvalidZoom { zoom: 23, .. }));
    }

    #[test]
    fn rejects_non_numeric_components() {
        assert!(TileRequest::forest("ten", "0", "0").is_err());
        assert!(TileRequest::cadastre("10", "x", "0").is_err());
    }

    #[test]
    fn rejects_coordinate_out_of_range_for_zoom() {
        let err = TileRequest::forest("2", "99", "0").unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinate(_)));
    }

    #[test]
    fn admin_layer_outside_allow_list_is_rejected() {
        let err = TileRequest::admin("arrondissements", "5", "0", "0").unwrap_err();
        assert!(matches!(err, Error::LayerNotFound(_)));
    }

    #[test]
    fn admin_layer_in_allow_list_is_accepted() {
        let req = TileRequest::admin("communes", "5", "0", "0").unwrap();
        assert_eq!(req.admin_layer(), Some(AdminLayer::Communes));
        assert_eq!(req.fingerprint(), "tile:admin:communes:5:0:0");
    }

    #[test]
    fn forest_fingerprint_has_no_layer_segment() {
        let req = TileRequest::forest("5", "1", "1").unwrap();
        assert_eq!(req.fingerprint(), "tile:foret:5:1:1");
    }
}
