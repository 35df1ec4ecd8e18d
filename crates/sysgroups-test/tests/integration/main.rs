mod aggregator;
mod helpers;
mod resolver;
