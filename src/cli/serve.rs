use crate::cli::{load_config, make_offline, ServeArgs};
use crate::server;
use std::sync::Arc;

pub async fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.offline {
        make_offline(&mut config);
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    config.validate()?;

    server::serve(Arc::new(config)).await?;
    Ok(())
}
