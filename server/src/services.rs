pub mod relayservice;
