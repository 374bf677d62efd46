use protobuf::{
    stream_relay_client::StreamRelayClient, CommandRequest, StartRequest, StatusRequest,
    StopRequest,
};
use tonic::{metadata::AsciiMetadataValue, transport::Channel, Request, Status};

const USER_ID_KEY: &str = "x-user-id";

pub struct ClientCli {
    inner: RelayClient,
    user: AsciiMetadataValue,
}

type RelayClient = StreamRelayClient<Channel>;

impl ClientCli {
    pub async fn connect(
        user: &str,
        server_addr: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let user = user.parse()?;
        let inner = RelayClient::connect(format!("http://{}", server_addr)).await?;
        Ok(Self { inner, user })
    }

    /// wrap a message in a request that carries our user id
    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request
            .metadata_mut()
            .insert(USER_ID_KEY, self.user.clone());
        request
    }

    pub async fn start_stream(
        &mut self,
        source_url: &str,
        destination_base: &str,
        stream_key: &str,
    ) -> Result<(), Status> {
        let request = self.request(StartRequest {
            source_url: source_url.into(),
            destination_base: destination_base.into(),
            stream_key: stream_key.into(),
        });
        let response = self.inner.start_stream(request).await?;
        println!("{}", response.into_inner().message);
        Ok(())
    }

    pub async fn stop_stream(&mut self) -> Result<(), Status> {
        let request = self.request(StopRequest {});
        let response = self.inner.stop_stream(request).await?;
        println!("{}", response.into_inner().message);
        Ok(())
    }

    pub async fn query_status(&mut self) -> Result<(), Status> {
        let request = self.request(StatusRequest {});
        let response = self.inner.query_status(request).await?;
        println!("{}", response.into_inner().message);
        Ok(())
    }

    /// Send chat-style command text and print the reply
    pub async fn send_command(&mut self, text: &str) -> Result<(), Status> {
        let request = self.request(CommandRequest { text: text.into() });
        let response = self.inner.send_command(request).await?;
        println!("{}", response.into_inner().reply);
        Ok(())
    }
}
