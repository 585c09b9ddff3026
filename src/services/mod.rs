pub mod city_sync;

pub use city_sync::{CityInformationClient, CityService, JsonCityInformationClient};
