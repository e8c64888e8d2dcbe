use anyhow::{anyhow, Result};

use super::args::ProvisionCliArgs;
use super::open_remote;
use crate::users::{ExternalIdentity, UserProvisioner};

pub async fn handle_provision_command(args: ProvisionCliArgs) -> Result<()> {
    let (config, conn, gateway) = open_remote()?;
    let provisioner = UserProvisioner::new(&gateway, config.webex.prefix.clone());

    let identity = ExternalIdentity {
        id: args.user_id,
        first_name: args.first_name,
        last_name: args.last_name,
        username: args.username,
        email: args.email,
    };

    let account = provisioner
        .get_remote_user(&conn, &identity, args.check_auth)
        .await
        .ok_or_else(|| anyhow!("No WebEx account available for user {}", identity.id))?;

    println!("User:      {}", account.local_user_id);
    println!("WebEx ID:  {}", account.login_id);
    println!("Remote ID: {}", account.remote_user_id);
    Ok(())
}
