use crate::config::{
    ACQUIRE_FIRST_DELAY_MS, ACQUIRE_RETRY_MS, INITIAL_CENTER, INITIAL_ZOOM, MAX_ZOOM, MIN_ZOOM,
    TILE_ATTRIBUTION, TILE_MAX_ZOOM, TILE_SUBDOMAINS, TILE_URL,
};
use crate::engine::{EngineError, MapEngine, MapView, Pane, TileLayerSpec};

pub const INITIAL_VIEW: MapView = MapView {
    center: INITIAL_CENTER,
    zoom: INITIAL_ZOOM,
    min_zoom: MIN_ZOOM,
    max_zoom: MAX_ZOOM,
};

pub const BASE_TILES: TileLayerSpec = TileLayerSpec {
    url: TILE_URL,
    subdomains: TILE_SUBDOMAINS,
    max_zoom: TILE_MAX_ZOOM,
    attribution: TILE_ATTRIBUTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Acquired,
    /// An engine already exists for this mount; nothing was built.
    AlreadyAcquired,
    /// The container node is not in the document yet.
    Retry,
}

/// Delay before acquisition attempt `attempt` (zero-based).
pub const fn acquire_delay_ms(attempt: u32) -> u32 {
    if attempt == 0 {
        ACQUIRE_FIRST_DELAY_MS
    } else {
        ACQUIRE_RETRY_MS
    }
}

/// Sole owner of the rendering engine for one mounted map.
pub struct ViewportController<E> {
    engine: Option<E>,
}

impl<E> Default for ViewportController<E> {
    fn default() -> Self {
        Self { engine: None }
    }
}

impl<E: MapEngine> ViewportController<E> {
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    /// Build the engine on `node` once it exists, then attach the base tiles
    /// and the render panes. Re-entry after success is a no-op.
    pub fn acquire<N>(
        &mut self,
        node: Option<N>,
        build: impl FnOnce(N, &MapView) -> Result<E, EngineError>,
    ) -> Result<Acquire, EngineError> {
        if self.engine.is_some() {
            return Ok(Acquire::AlreadyAcquired);
        }
        let Some(node) = node else {
            return Ok(Acquire::Retry);
        };

        let mut engine = build(node, &INITIAL_VIEW)?;
        if let Err(err) = prepare(&mut engine) {
            engine.release();
            return Err(err);
        }
        self.engine = Some(engine);
        Ok(Acquire::Acquired)
    }

    /// Destroy the engine. Returns whether there was one.
    pub fn release(&mut self) -> bool {
        match self.engine.take() {
            Some(mut engine) => {
                engine.release();
                true
            }
            None => false,
        }
    }
}

fn prepare<E: MapEngine>(engine: &mut E) -> Result<(), EngineError> {
    engine.add_tile_layer(&BASE_TILES)?;
    for pane in Pane::ALL {
        engine.create_pane(pane)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::RecordingEngine;

    fn build_ok(_node: (), view: &MapView) -> Result<RecordingEngine, EngineError> {
        assert_eq!(view.zoom, 11.0);
        assert_eq!(view.min_zoom, 10.0);
        assert_eq!(view.max_zoom, 16.0);
        Ok(RecordingEngine::default())
    }

    #[test]
    fn missing_node_asks_for_retry() {
        let mut controller = ViewportController::<RecordingEngine>::default();
        let outcome = controller.acquire(None::<()>, build_ok).unwrap();
        assert_eq!(outcome, Acquire::Retry);
        assert!(!controller.is_ready());
    }

    #[test]
    fn acquire_attaches_tiles_and_panes_once() {
        let mut controller = ViewportController::<RecordingEngine>::default();
        assert_eq!(controller.acquire(Some(()), build_ok).unwrap(), Acquire::Acquired);
        assert_eq!(
            controller
                .acquire(Some(()), |_: (), _: &MapView| -> Result<RecordingEngine, EngineError> {
                    panic!("engine must not be rebuilt")
                })
                .unwrap(),
            Acquire::AlreadyAcquired
        );

        let engine = controller.engine_mut().unwrap();
        assert_eq!(engine.tile_layers, 1);
        assert_eq!(engine.panes, vec![Pane::Contours, Pane::Territories, Pane::Places]);
    }

    #[test]
    fn pane_stacking_keeps_markers_on_top() {
        assert!(Pane::Places.z_index() > Pane::Contours.z_index());
        assert!(Pane::Contours.z_index() > Pane::Territories.z_index());
    }

    #[test]
    fn build_failure_leaves_controller_unacquired() {
        let mut controller = ViewportController::<RecordingEngine>::default();
        let err = controller
            .acquire(Some(()), |_: (), _: &MapView| Err(EngineError::MissingGlobal("L")))
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingGlobal("L")));
        assert!(!controller.is_ready());
    }

    #[test]
    fn release_is_idempotent() {
        let mut controller = ViewportController::<RecordingEngine>::default();
        controller.acquire(Some(()), build_ok).unwrap();
        assert!(controller.release());
        assert!(!controller.release());
        assert!(!controller.is_ready());
    }

    #[test]
    fn first_attempt_waits_longer_than_retries() {
        assert_eq!(acquire_delay_ms(0), 100);
        assert_eq!(acquire_delay_ms(1), 50);
        assert_eq!(acquire_delay_ms(7), 50);
    }
}
