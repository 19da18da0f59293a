/*!
Humanized input generation.

Each generator owns its random source and turns a target into a finite,
ordered sequence that a driver replays:

- `mouse`    -> `PathGenerator`      (Bezier pointer paths, overshoot, tremor)
- `typing`   -> `KeystrokeSequencer` (key cadence, think pauses, corrected typos)
- `scroll`   -> `ScrollSequencer`    (chunked scrolling, scroll-backs, pauses)
- `timing`   -> `Timing`             (delay presets, Gaussian, backoff, cancellable sleep)
- `policy`   -> `ChanceTable`        (every probabilistic branch, by name)
- `keyboard`                         (QWERTY adjacency tables)

Generators are synchronous and take `&mut self`; the only place anything
blocks is `timing::sleep`, which honours a `CancellationToken`.
*/

pub mod keyboard;
pub mod mouse;
pub mod policy;
pub mod scroll;
pub mod timing;
pub mod typing;

pub use mouse::{PathGenerator, Point};
pub use policy::{Chance, ChanceTable};
pub use scroll::{ScrollAction, ScrollDirection, ScrollSequencer, net_distance};
pub use timing::{ActionTimer, Timing, backoff_ceiling, sleep};
pub use typing::{KeyStroke, KeystrokeSequencer, replay_text};
