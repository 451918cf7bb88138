
mod create;
mod patch;
mod public;
