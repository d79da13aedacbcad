mod sweep;
mod targeter;
