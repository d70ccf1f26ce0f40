mod coordinator;
mod helpers;
mod pipeline;
