//! Screen-to-screen flow: user selection, level map, play and results.

use std::error::Error;

use rand::rngs::StdRng;
use tracing::debug;

use kids_math_core::model::{LevelId, ProfileDraft, UserProfile};
use services::{SessionError, SessionRunner};

use crate::console::Console;
use crate::screens;

type GameResult<T> = Result<T, Box<dyn Error>>;

enum MapChoice {
    Play(LevelId),
    Leave(Leave),
}

enum Leave {
    SwitchUser,
    Quit,
}

enum AfterResult {
    Play(LevelId),
    Map,
    Quit,
}

pub struct Game {
    runner: SessionRunner,
    console: Console,
    rng: StdRng,
}

impl Game {
    pub fn new(runner: SessionRunner, console: Console, rng: StdRng) -> Self {
        Self {
            runner,
            console,
            rng,
        }
    }

    /// Run until the player quits or stdin closes.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the console and storage errors outside a
    /// session's best-effort save.
    pub async fn run(mut self) -> GameResult<()> {
        loop {
            let current = self.runner.store().current_user().await?;
            let user = match current {
                Some(user) => user,
                None => match self.choose_user().await? {
                    Some(user) => user,
                    None => return Ok(()),
                },
            };

            match self.map_loop(&user).await? {
                Leave::SwitchUser => {
                    if self.choose_user().await?.is_none() {
                        return Ok(());
                    }
                }
                Leave::Quit => return Ok(()),
            }
        }
    }

    async fn choose_user(&mut self) -> GameResult<Option<UserProfile>> {
        let store = self.runner.store().clone();
        loop {
            let users = store.list_users().await?;
            self.console.show(&screens::user_list(&users));
            let Some(input) = self.console.ask("").await? else {
                return Ok(None);
            };

            match input.as_str() {
                "q" => return Ok(None),
                "n" => {
                    if let Some(user) = self.register().await? {
                        return Ok(Some(user));
                    }
                }
                other => {
                    if let Some(rest) = other.strip_prefix('d') {
                        if let Some(user) = pick(&users, rest.trim()) {
                            let confirm = self
                                .console
                                .ask(&format!("{} を けしますか？ (y/n)", user.name()))
                                .await?;
                            if confirm.as_deref() == Some("y") {
                                store.delete_user(user.id()).await?;
                            }
                        }
                        continue;
                    }
                    if let Some(user) = pick(&users, other) {
                        return Ok(Some(store.set_current_user(user.id()).await?));
                    }
                }
            }
        }
    }

    async fn register(&mut self) -> GameResult<Option<UserProfile>> {
        let Some(name) = self.console.ask("なまえ").await? else {
            return Ok(None);
        };
        let Some(age) = self.console.ask("なんさい？").await? else {
            return Ok(None);
        };
        let Ok(age) = age.parse::<u8>() else {
            self.console.show("すうじで おしえてね");
            return Ok(None);
        };

        match self
            .runner
            .store()
            .register_user(ProfileDraft::new(name, age))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(services::ProgressError::Profile(err)) => {
                self.console.show(&err.to_string());
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn map_loop(&mut self, user: &UserProfile) -> GameResult<Leave> {
        loop {
            let states = self.runner.store().level_states(user.id()).await?;
            self.console
                .show(&screens::level_map(self.runner.store().catalog(), &states));

            let choice = match self.console.ask(user.name()).await? {
                None => MapChoice::Leave(Leave::Quit),
                Some(input) => match input.as_str() {
                    "q" => MapChoice::Leave(Leave::Quit),
                    "u" => MapChoice::Leave(Leave::SwitchUser),
                    other => match other.parse::<LevelId>() {
                        Ok(level) => MapChoice::Play(level),
                        Err(_) => continue,
                    },
                },
            };

            let mut level = match choice {
                MapChoice::Play(level) => level,
                MapChoice::Leave(leave) => return Ok(leave),
            };

            loop {
                match self.play(user, level).await? {
                    AfterResult::Play(next) => level = next,
                    AfterResult::Map => break,
                    AfterResult::Quit => return Ok(Leave::Quit),
                }
            }
        }
    }

    async fn play(&mut self, user: &UserProfile, level: LevelId) -> GameResult<AfterResult> {
        let mut session = match self.runner.start(user.id(), level, &mut self.rng).await {
            Ok(session) => session,
            Err(SessionError::Locked(_) | SessionError::UnknownLevel(_)) => {
                self.console.show("そのレベルは まだ あそべないよ");
                return Ok(AfterResult::Map);
            }
            Err(err) => return Err(err.into()),
        };

        while let Some(question) = session.current_question().cloned() {
            self.console
                .show(&screens::question(&question, session.progress()));
            loop {
                let Some(input) = self.console.ask("").await? else {
                    return Ok(AfterResult::Quit);
                };
                match input.as_str() {
                    "q" => {
                        debug!(level = %level, "session abandoned");
                        return Ok(AfterResult::Map);
                    }
                    "h" => {
                        if let Some(hint) = screens::hint(&question) {
                            self.console.show(&hint);
                        }
                        continue;
                    }
                    _ => {}
                }
                let Ok(value) = input.parse::<u32>() else {
                    continue;
                };
                if !question.choices().contains(&value) {
                    continue;
                }

                let outcome = self.runner.answer(&mut session, value)?;
                if outcome.is_correct {
                    self.console.show("⭕ せいかい！");
                    break;
                }
                self.console.show("❌ もういちど！");
            }
        }

        let result = self.runner.finish(session).await?;
        self.console.show(&screens::result(&result));
        loop {
            let Some(input) = self.console.ask("").await? else {
                return Ok(AfterResult::Quit);
            };
            match (input.as_str(), result.next_level) {
                ("r", _) => return Ok(AfterResult::Play(level)),
                ("n", Some(next)) => return Ok(AfterResult::Play(next)),
                ("m", _) => return Ok(AfterResult::Map),
                _ => {}
            }
        }
    }
}

fn pick<'a>(users: &'a [UserProfile], raw: &str) -> Option<&'a UserProfile> {
    let index = raw.parse::<usize>().ok()?.checked_sub(1)?;
    users.get(index)
}
