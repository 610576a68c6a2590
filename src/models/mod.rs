pub mod customer;
pub mod job;
pub mod message;
pub mod profile;
pub mod request;
pub mod request_match;
pub mod quote;

pub use customer::{Customer, CustomerCreate, CustomerUpdate};
pub use job::{Job, JobCreate, JobStatus, JobUpdate};
pub use message::{Message, MessageCreate, MessageWithSender, SenderSummary};
pub use profile::{BusinessType, Profile, ProfileRole, ProfileUpdate};
pub use request::{Request, RequestCreate, RequestStatus, RequestSummary, RequestUpdate};
pub use request_match::{MatchStatus, RequestMatch};
pub use quote::{Quote, QuoteCreate, QuoteLineItem, QuoteStatus, QuoteUpdate};
