mod clock;
mod phase;
mod session;

pub use clock::{ClockSource, ManualClock, TickCallback, TokioClock};
pub use phase::{Countdown, Phase, PhaseKind};
pub use session::{Generation, PromptSelection, Session};
