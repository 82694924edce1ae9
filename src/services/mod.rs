pub mod live_state;
pub mod refresher;
pub mod window_gain;

pub use live_state::LiveState;
pub use refresher::{is_sane, CycleOutcome, RankedSource, RefreshPhase, Refresher};
pub use window_gain::{compute_window_gains, WindowedGainCalculator};
