mod switch;
pub(crate) use switch::ConfigPathSwitchCommand;
