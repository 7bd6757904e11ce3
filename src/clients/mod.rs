pub mod appspace_client;
