//! Administrative requests served outside the tick loop.

use crate::algorithms::mapping::{MapInfo, MapTile};
use crate::config::EngineConfig;
use crate::error::Result;

use super::LocalizationEngine;

/// Request from a management client.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminRequest {
    GetParticleCount,
    /// Resize the population. Forces a reset.
    SetParticleCount(usize),
    /// Scatter the particles over the whole map.
    Reset,
    GetMapInfo,
    /// Raw occupancy values of a sub-rectangle, lower-left cell `(x, y)`.
    GetMapTile {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    GetConfig,
}

/// Reply to an [`AdminRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdminResponse {
    /// Request applied; nothing to return.
    Ack,
    ParticleCount(usize),
    MapInfo(MapInfo),
    MapTile(MapTile),
    Config(Box<EngineConfig>),
}

impl LocalizationEngine {
    /// Serve one administrative request.
    pub fn handle_admin(&mut self, request: AdminRequest) -> Result<AdminResponse> {
        log::debug!("Admin request: {:?}", request);
        let response = match request {
            AdminRequest::GetParticleCount => {
                AdminResponse::ParticleCount(self.filter().num_particles())
            }
            AdminRequest::SetParticleCount(count) => {
                self.set_num_particles(count)?;
                AdminResponse::Ack
            }
            AdminRequest::Reset => {
                self.reset();
                AdminResponse::Ack
            }
            AdminRequest::GetMapInfo => AdminResponse::MapInfo(self.map().info()),
            AdminRequest::GetMapTile {
                x,
                y,
                width,
                height,
            } => AdminResponse::MapTile(self.map().tile(x, y, width, height)?),
            AdminRequest::GetConfig => AdminResponse::Config(Box::new(self.config().clone())),
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::mapping::GridMap;
    use crate::core::types::Pose;
    use crate::error::{EngineError, MapError};
    use approx::assert_relative_eq;

    fn engine() -> LocalizationEngine {
        let map = GridMap::from_fn(40, 30, 25.0, 240, 2000.0, |i, j| {
            if i == 10 && j < 5 { 0 } else { 255 }
        })
        .unwrap();
        let mut config = EngineConfig::default();
        config.filter.num_particles = 120;
        config.filter.seed = 3;
        config.sensor.num_ranges = 4;
        config.sensor.max_range = 2000.0;
        LocalizationEngine::with_map(config, map).unwrap()
    }

    #[test]
    fn test_particle_count() {
        let mut engine = engine();
        assert_eq!(
            engine.handle_admin(AdminRequest::GetParticleCount).unwrap(),
            AdminResponse::ParticleCount(120)
        );
        assert_eq!(
            engine.handle_admin(AdminRequest::SetParticleCount(80)).unwrap(),
            AdminResponse::Ack
        );
        assert_eq!(
            engine.handle_admin(AdminRequest::GetParticleCount).unwrap(),
            AdminResponse::ParticleCount(80)
        );
        assert!(engine.handle_admin(AdminRequest::SetParticleCount(0)).is_err());
    }

    #[test]
    fn test_reset_clears_collapse() {
        let mut engine = engine();
        engine.tick(&[100.0; 4], &Pose::default()).unwrap();
        assert!(engine.tick(&[100.0; 4], &Pose::new(1e6, 0.0, 0.0)).is_err());
        assert!(engine.is_collapsed());

        assert_eq!(engine.handle_admin(AdminRequest::Reset).unwrap(), AdminResponse::Ack);
        assert!(!engine.is_collapsed());
    }

    #[test]
    fn test_map_info() {
        let mut engine = engine();
        let AdminResponse::MapInfo(info) = engine.handle_admin(AdminRequest::GetMapInfo).unwrap()
        else {
            panic!("expected map info");
        };
        assert_eq!(info.width, 40);
        assert_eq!(info.height, 30);
        assert_relative_eq!(info.cell_size, 25.0);
        assert_relative_eq!(info.pixels_per_unit, 0.04);
        assert_eq!(info.occupancy_threshold, 240);
    }

    #[test]
    fn test_map_tile() {
        let mut engine = engine();
        let request = AdminRequest::GetMapTile {
            x: 9,
            y: 3,
            width: 3,
            height: 4,
        };
        let AdminResponse::MapTile(tile) = engine.handle_admin(request).unwrap() else {
            panic!("expected map tile");
        };
        assert_eq!(tile.cells.len(), 12);
        // Column 1 of the tile is grid column 10: wall below row 5.
        assert_eq!(tile.get(1, 0), Some(0));
        assert_eq!(tile.get(1, 1), Some(0));
        assert_eq!(tile.get(1, 2), Some(255));
        assert_eq!(tile.get(0, 0), Some(255));
    }

    #[test]
    fn test_map_tile_out_of_bounds() {
        let mut engine = engine();
        let request = AdminRequest::GetMapTile {
            x: 35,
            y: 0,
            width: 10,
            height: 1,
        };
        let err = engine.handle_admin(request).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Map(MapError::TileOutOfBounds { map_width: 40, .. })
        ));
    }

    #[test]
    fn test_get_config() {
        let mut engine = engine();
        let AdminResponse::Config(config) = engine.handle_admin(AdminRequest::GetConfig).unwrap()
        else {
            panic!("expected config");
        };
        assert_eq!(config.filter.num_particles, 120);
        assert_eq!(*config, *engine.config());
    }
}
