// ShakeWatch - Background Tasks

pub mod sensor;
