//! Account session commands.

use anyhow::{Context, Result};

use askhive_client::{ForumService, Transport};

/// Run the register command.
pub async fn register<T: Transport>(
    service: &ForumService<T>,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = read_password(password)?;
    let user = service
        .register(username, email, &password)
        .await
        .context("Registration failed")?;

    println!("Account created. Signed in as {}.", user.username);
    Ok(())
}

/// Run the login command.
pub async fn login<T: Transport>(
    service: &ForumService<T>,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let password = read_password(password)?;
    let user = service
        .sign_in(username, &password)
        .await
        .context("Login failed")?;

    println!("Signed in as {}.", user.username);
    if user.is_admin {
        println!("  (admin: may escalate and mark questions answered)");
    }
    Ok(())
}

/// Run the logout command.
pub async fn logout<T: Transport>(service: &ForumService<T>) -> Result<()> {
    service.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

/// Run the whoami command.
pub async fn whoami<T: Transport>(service: &ForumService<T>) -> Result<()> {
    match service.restore_session().await? {
        Some(user) => {
            println!("User:  {}", user.username);
            println!("ID:    {}", user.id);
            if let Some(email) = &user.email {
                println!("Email: {email}");
            }
            println!("Admin: {}", if user.is_admin { "yes" } else { "no" });
        }
        None => {
            println!("Not signed in.");
            println!();
            println!("Run 'askhive login --username <name>' to sign in.");
        }
    }
    Ok(())
}

fn read_password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}
