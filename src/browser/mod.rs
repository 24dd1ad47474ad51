pub mod cdp;
pub mod debug;
pub mod driver;
pub mod network;
pub mod session;
pub mod wait;

pub use cdp::CdpPage;
pub use debug::DebugSink;
pub use driver::{Key, Locator, PageDriver};
pub use session::{BrowserSession, CdpLauncher, CdpSession, Launcher, SessionConfig};
