pub use {anyhow,
         itertools,
         log,
         polars,
         serde,
         serde_json,
         statrs};
