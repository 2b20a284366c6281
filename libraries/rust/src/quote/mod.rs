pub mod client;
pub use client::Client;
pub use client::Error;
pub use client::Interface;
pub use client::MockInterface;
pub use client::Quote;
pub use client::DEFAULT_BASE_URL;
pub use client::DEFAULT_TIMEOUT;
