//! Client-side screen state driven through [`crate::client::MemberClient`].

pub mod form;
pub mod list;
