//! Parallel rendering of independent views.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use raster_common::{RasterBuffer, RasterError, RasterResult};

use crate::compositor::{Renderer, ViewRequest};

impl Renderer<'_> {
    /// Render every request on a pool of at most `max_threads` workers.
    ///
    /// Results come back in request order. A failing request yields its own
    /// error and does not affect the others.
    pub fn render_batch(
        &self,
        requests: &[ViewRequest],
    ) -> RasterResult<Vec<RasterResult<RasterBuffer>>> {
        let threads = self.config().max_threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| RasterError::invalid_argument(format!("cannot start render pool: {}", e)))?;

        let start = Instant::now();
        let results: Vec<RasterResult<RasterBuffer>> = pool.install(|| {
            requests
                .par_iter()
                .map(|request| self.render_view(request))
                .collect()
        });

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(failed, total = requests.len(), "Some views failed to render");
        }
        info!(
            views = requests.len(),
            threads,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered batch"
        );
        Ok(results)
    }
}
