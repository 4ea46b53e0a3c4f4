pub mod accumulator;
pub mod snapshot;

pub use accumulator::StatisticsAccumulator;
pub use snapshot::StatisticSnapshot;
