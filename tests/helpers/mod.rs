pub mod fake_cluster;

pub use fake_cluster::FakeCluster;
