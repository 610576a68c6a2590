// One module per resource. Every handler runs behind the bearer-auth
// middleware and scopes reads/writes by the caller's id; owner columns come
// from the token, never from the request body.
pub mod conversations;
pub mod customers;
pub mod jobs;
pub mod leads;
pub mod messages;
pub mod profiles;
pub mod quotes;
pub mod requests;
