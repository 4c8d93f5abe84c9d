//! One-off seeding: insert the demo user, dump every user, release the pool.

use std::io::Write;

use tracing::{error, info};

use crate::{
    error::RepoError,
    users::{NewUser, User, UserRepository},
};

pub fn demo_user() -> NewUser {
    NewUser::new("Elliott", "xelliottx@example-user.com")
}

async fn create_and_scan(repo: &dyn UserRepository, new: &NewUser) -> Result<Vec<User>, RepoError> {
    let created = repo.create_user(&new.name, &new.email).await?;
    info!(user_id = %created.id, email = %created.email, "seed user inserted");
    repo.list_users().await
}

/// Runs the seed against `repo`, writing the scanned users as JSON to `out`.
///
/// Returns the process exit status: `0` on success, `1` on any repository
/// error. The repository is closed exactly once on either path.
pub async fn run(repo: &dyn UserRepository, new: &NewUser, out: &mut impl Write) -> u8 {
    let outcome = create_and_scan(repo, new).await;
    repo.close().await;

    match outcome {
        Ok(users) => {
            info!(count = users.len(), "users");
            match serde_json::to_string_pretty(&users) {
                Ok(json) => {
                    if let Err(e) = writeln!(out, "users {json}") {
                        error!(error = %e, "failed to write users");
                        return 1;
                    }
                    0
                }
                Err(e) => {
                    error!(error = %e, "failed to serialize users");
                    1
                }
            }
        }
        Err(e) => {
            error!(error = %e, "seed failed");
            1
        }
    }
}
