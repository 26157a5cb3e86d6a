use clap::{Args, Subcommand};
use driveshare_app::domain::users::{
    UsersService,
    data::NewUser,
    records::{Role, UserUuid},
};

use crate::cli::{Session, failed, output::table};

#[derive(Debug, Args)]
pub(crate) struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Debug, Subcommand)]
enum UsersSubcommand {
    /// List every profile (admin only)
    List,
    /// Create a profile
    Register(RegisterArgs),
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    email: String,

    /// Display name; defaults to the email's local part
    #[arg(long, default_value = "")]
    name: String,

    /// Role (renter, owner, admin); renters by default
    #[arg(long)]
    role: Option<Role>,

    /// Avatar image URL
    #[arg(long)]
    avatar: Option<String>,
}

pub(crate) async fn run(command: UsersCommand, session: &Session) -> Result<(), String> {
    let users = &session.app.users;

    match command.command {
        UsersSubcommand::List => {
            let listed = users
                .list_users(session.actor)
                .await
                .map_err(failed("list users"))?;

            let rows = listed.iter().map(|user| {
                [
                    user.uuid.to_string(),
                    user.name.clone(),
                    user.email.clone(),
                    user.role.to_string(),
                ]
            });

            println!("{}", table(["User", "Name", "Email", "Role"], rows, 0..0));
        }
        UsersSubcommand::Register(args) => {
            let user = users
                .register_user(NewUser {
                    uuid: UserUuid::new(),
                    name: args.name,
                    email: args.email,
                    role: args.role,
                    avatar: args.avatar,
                })
                .await
                .map_err(failed("register user"))?;

            println!("user_uuid: {}", user.uuid);
            println!("name: {}", user.name);
            println!("role: {}", user.role);
            println!("pass --as {} to act as this user", user.uuid);
        }
    }

    Ok(())
}
