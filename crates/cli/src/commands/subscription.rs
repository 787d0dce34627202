//! `subscribe`, `unsubscribe` and `member`

use anyhow::{Context, Result};
use clap::Args;
use listsync_core::{FieldOverrides, MailingList};
use listsync_domain::{Config, Outcome, SubscriberInfo};
use tracing::info;

use crate::context::AppContext;

#[derive(Args, Debug)]
pub struct SubscribeArgs {
    pub email: String,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    /// Interest group; repeat for several
    #[arg(long = "interest")]
    pub interests: Vec<String>,

    /// IP address the opt-in came from
    #[arg(long)]
    pub user_ip: Option<String>,

    /// Do not send the welcome email
    #[arg(long)]
    pub no_welcome: bool,
}

impl SubscribeArgs {
    fn subscriber_info(&self) -> SubscriberInfo {
        let mut info = SubscriberInfo::new();
        if let Some(first_name) = &self.first_name {
            info.insert("first_name", first_name.as_str());
        }
        if let Some(last_name) = &self.last_name {
            info.insert("last_name", last_name.as_str());
        }
        if let Some(user_ip) = &self.user_ip {
            info.insert("user_ip", user_ip.as_str());
        }
        if !self.interests.is_empty() {
            info.insert("interests", self.interests.clone());
        }
        info
    }
}

pub async fn subscribe(config: &Config, args: &SubscribeArgs) -> Result<()> {
    let ctx = AppContext::build(config)?;
    let outcome = ctx
        .list
        .subscribe(&args.email, &args.subscriber_info(), !args.no_welcome, &FieldOverrides::new())
        .await
        .with_context(|| format!("failed to subscribe {}", args.email))?;

    info!(address = %args.email, outcome = %outcome, "cli.subscribe.finished");
    println!("{}", outcome.user_message());
    Ok(())
}

pub async fn unsubscribe(config: &Config, email: &str) -> Result<()> {
    let ctx = AppContext::build(config)?;
    let outcome = ctx
        .list
        .unsubscribe(email)
        .await
        .with_context(|| format!("failed to unsubscribe {email}"))?;

    info!(address = %email, outcome = %outcome, "cli.unsubscribe.finished");
    println!("{}", unsubscribe_message(email, outcome));
    Ok(())
}

pub async fn member(config: &Config, email: &str) -> Result<()> {
    let ctx = AppContext::build(config)?;
    match ctx.list.member_info(email).await {
        Some(member) => println!("{}", serde_json::to_string_pretty(&member)?),
        None => println!("{email} is not a member of the list"),
    }
    Ok(())
}

fn unsubscribe_message(email: &str, outcome: Outcome) -> String {
    match outcome {
        Outcome::Success => format!("{email} has been unsubscribed."),
        Outcome::Queued => format!("{email} will be unsubscribed once the list is reachable."),
        Outcome::NotSubscribed | Outcome::NotFound => {
            format!("{email} is not subscribed to the list.")
        }
        Outcome::Failure | Outcome::InvalidAddress => format!("{email} could not be unsubscribed ({outcome})."),
    }
}

#[cfg(test)]
mod tests {
    use listsync_domain::FieldValue;

    use super::*;

    fn args(email: &str) -> SubscribeArgs {
        SubscribeArgs {
            email: email.to_string(),
            first_name: None,
            last_name: None,
            interests: Vec::new(),
            user_ip: None,
            no_welcome: false,
        }
    }

    #[test]
    fn only_given_fields_end_up_in_the_record() {
        let mut args = args("ada@example.com");
        args.first_name = Some("Ada".into());
        args.interests = vec!["news".into()];

        let info = args.subscriber_info();

        assert_eq!(info.len(), 2);
        assert_eq!(info.get("first_name"), Some(&FieldValue::from("Ada")));
        assert_eq!(info.get("interests"), Some(&FieldValue::List(vec!["news".into()])));
        assert!(!info.contains_key("last_name"));
    }

    #[test]
    fn unsubscribe_messages_name_the_address() {
        assert_eq!(
            unsubscribe_message("a@x.com", Outcome::NotSubscribed),
            "a@x.com is not subscribed to the list."
        );
        assert!(unsubscribe_message("a@x.com", Outcome::Failure).contains("(failure)"));
    }
}
