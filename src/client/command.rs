//! Typed `mc` command lines.
//!
//! Each administrative operation is one [`McCommand`] variant. The variant
//! fixes argument order and flags, so a call site cannot pass a policy where a
//! user is expected. Secret arguments are tracked per position and masked in
//! [`McCommand::display_args`].
//!
//! | Variant          | Command line                                        |
//! |------------------|-----------------------------------------------------|
//! | `AliasList`      | `mc --json alias list`                              |
//! | `AliasSet`       | `mc --json alias set NAME URL AK SK`                |
//! | `AliasRemove`    | `mc --json alias remove NAME`                       |
//! | `PolicyList`     | `mc --json admin policy list T`                     |
//! | `PolicyInfo`     | `mc --json admin policy info T NAME`                |
//! | `PolicyCreate`   | `mc --json admin policy create T NAME FILE`         |
//! | `PolicyRemove`   | `mc --json admin policy remove T NAME`              |
//! | `PolicyAttach`   | `mc --json admin policy attach T POLICY --user AK`  |
//! | `PolicyDetach`   | `mc --json admin policy detach T POLICY --user AK`  |
//! | `UserList`       | `mc --json admin user list T`                       |
//! | `UserInfo`       | `mc --json admin user info T AK`                    |
//! | `UserAdd`        | `mc --json admin user add T AK SK`                  |
//! | `UserEnable`     | `mc --json admin user enable T AK`                  |
//! | `UserDisable`    | `mc --json admin user disable T AK`                 |
//! | `UserRemove`     | `mc --json admin user remove T AK`                  |
//! | `BucketList`     | `mc --json ls T`                                    |
//! | `MakeBucket`     | `mc --json mb T/NAME`                               |
//! | `RemoveBucket`   | `mc --json rb T/NAME`                               |
//!
//! `T` is the target alias the client resolves through `MC_HOST_<T>`.

use crate::types::Secret;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McCommand {
    AliasList,
    AliasSet {
        name: String,
        url: String,
        access_key: String,
        secret_key: Secret,
    },
    AliasRemove {
        name: String,
    },
    PolicyList,
    PolicyInfo {
        name: String,
    },
    PolicyCreate {
        name: String,
        file: PathBuf,
    },
    PolicyRemove {
        name: String,
    },
    PolicyAttach {
        policy: String,
        user: String,
    },
    PolicyDetach {
        policy: String,
        user: String,
    },
    UserList,
    UserInfo {
        access_key: String,
    },
    UserAdd {
        access_key: String,
        secret_key: Secret,
    },
    UserEnable {
        access_key: String,
    },
    UserDisable {
        access_key: String,
    },
    UserRemove {
        access_key: String,
    },
    BucketList,
    MakeBucket {
        name: String,
    },
    RemoveBucket {
        name: String,
    },
}

/// One command-line argument and whether it must be masked.
enum Arg<'a> {
    Plain(String),
    Secret(&'a Secret),
}

impl McCommand {
    /// Whether the command talks to a server (and so needs the target alias).
    ///
    /// Alias management only edits the local `mc` configuration.
    pub fn needs_target(&self) -> bool {
        !matches!(
            self,
            Self::AliasList | Self::AliasSet { .. } | Self::AliasRemove { .. }
        )
    }

    /// Whether the command changes state, locally or on the server.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Self::AliasList
                | Self::PolicyList
                | Self::PolicyInfo { .. }
                | Self::UserList
                | Self::UserInfo { .. }
                | Self::BucketList
        )
    }

    /// Arguments exactly as passed to `mc`.
    pub fn to_cli_args(&self, target: &str) -> Vec<String> {
        self.args(target)
            .into_iter()
            .map(|arg| match arg {
                Arg::Plain(s) => s,
                Arg::Secret(secret) => secret.expose().to_string(),
            })
            .collect()
    }

    /// Arguments for logs and error reports, with secrets masked.
    pub fn display_args(&self, target: &str) -> Vec<String> {
        self.args(target)
            .into_iter()
            .map(|arg| match arg {
                Arg::Plain(s) => s,
                Arg::Secret(_) => Secret::MASK.to_string(),
            })
            .collect()
    }

    fn args(&self, target: &str) -> Vec<Arg<'_>> {
        let p = |s: &str| Arg::Plain(s.to_string());
        let t = || Arg::Plain(target.to_string());

        let mut args = vec![p("--json")];
        match self {
            Self::AliasList => args.extend([p("alias"), p("list")]),
            Self::AliasSet {
                name,
                url,
                access_key,
                secret_key,
            } => args.extend([
                p("alias"),
                p("set"),
                p(name),
                p(url),
                p(access_key),
                Arg::Secret(secret_key),
            ]),
            Self::AliasRemove { name } => args.extend([p("alias"), p("remove"), p(name)]),
            Self::PolicyList => args.extend([p("admin"), p("policy"), p("list"), t()]),
            Self::PolicyInfo { name } => {
                args.extend([p("admin"), p("policy"), p("info"), t(), p(name)])
            }
            Self::PolicyCreate { name, file } => args.extend([
                p("admin"),
                p("policy"),
                p("create"),
                t(),
                p(name),
                Arg::Plain(file.display().to_string()),
            ]),
            Self::PolicyRemove { name } => {
                args.extend([p("admin"), p("policy"), p("remove"), t(), p(name)])
            }
            Self::PolicyAttach { policy, user } => args.extend([
                p("admin"),
                p("policy"),
                p("attach"),
                t(),
                p(policy),
                p("--user"),
                p(user),
            ]),
            Self::PolicyDetach { policy, user } => args.extend([
                p("admin"),
                p("policy"),
                p("detach"),
                t(),
                p(policy),
                p("--user"),
                p(user),
            ]),
            Self::UserList => args.extend([p("admin"), p("user"), p("list"), t()]),
            Self::UserInfo { access_key } => {
                args.extend([p("admin"), p("user"), p("info"), t(), p(access_key)])
            }
            Self::UserAdd {
                access_key,
                secret_key,
            } => args.extend([
                p("admin"),
                p("user"),
                p("add"),
                t(),
                p(access_key),
                Arg::Secret(secret_key),
            ]),
            Self::UserEnable { access_key } => {
                args.extend([p("admin"), p("user"), p("enable"), t(), p(access_key)])
            }
            Self::UserDisable { access_key } => {
                args.extend([p("admin"), p("user"), p("disable"), t(), p(access_key)])
            }
            Self::UserRemove { access_key } => {
                args.extend([p("admin"), p("user"), p("remove"), t(), p(access_key)])
            }
            Self::BucketList => args.extend([p("ls"), t()]),
            Self::MakeBucket { name } => {
                args.extend([p("mb"), Arg::Plain(format!("{target}/{name}"))])
            }
            Self::RemoveBucket { name } => {
                args.extend([p("rb"), Arg::Plain(format!("{target}/{name}"))])
            }
        }
        args
    }
}
