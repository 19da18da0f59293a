/*!
Replaying generated input.

- `surface`: the `InputSurface` trait and a logging `DryRunSurface`
- `native`:  `NativeSurface`, real input through Enigo (feature `native-input`)
- `replay`:  `Replayer`, which paces sequences onto a surface

Example:
```no_run
use humanpace::config::Config;
use humanpace::executor::{DryRunSurface, Replayer};
use humanpace::humanize::{PathGenerator, Point};
use tokio_util::sync::CancellationToken;

# async fn run() -> humanpace::Result<()> {
let mut paths = PathGenerator::new(Config::default().mouse);
let path = paths.generate_path(Point::new(0.0, 0.0), Point::new(640.0, 360.0));
let total = paths.movement_duration(&path);

let mut replayer = Replayer::new(DryRunSurface::new(), CancellationToken::new());
replayer.replay_path(&path, total).await?;
# Ok(())
# }
```
*/

#[cfg(feature = "native-input")]
pub mod native;
pub mod replay;
pub mod surface;

#[cfg(feature = "native-input")]
pub use native::NativeSurface;
pub use replay::Replayer;
pub use surface::{DryRunSurface, InputSurface};
