mod generators;
mod round_trip;
