//! One module per `toonmap` subcommand.

pub(crate) mod guard;
pub(crate) mod map;
pub(crate) mod parse;
pub(crate) mod resolve;
