//! Process bootstrap helpers used by the binary before the server starts.

pub mod logger;
