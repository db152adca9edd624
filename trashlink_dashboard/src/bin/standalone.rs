use trashlink::BinDashboard;
use trashlink_dashboard::{ActorConfig, FrameBus, ServerConfig, spawn_bin_actor, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let bus = FrameBus::new(32);
    let cfg = ServerConfig::from_env();
    let (handle, actor) =
        spawn_bin_actor(BinDashboard::default(), bus.clone(), ActorConfig::from_env());

    let server = start_server(handle.clone(), bus, cfg).await?;
    // Park until the server exits, then let the actor finish.
    server.await.ok();
    handle.shutdown().await;
    actor.await.ok();
    Ok(())
}
