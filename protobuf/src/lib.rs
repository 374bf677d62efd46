tonic::include_proto!("streamrelay");
