//! Canned replies and trigger words.

pub const LAUGHTER_TRIGGERS: &[&str] = &["haha", "lol", "lmao", "rofl", "hehe"];

pub const LAUGHTER_REPLIES: &[&str] = &["Zorp zorp!👽", "LOL", "HAHAHA", "BAHAHAHAHA", "heh"];

/// Checked in order; the first word found is the one echoed back.
pub const INSULTING_WORDS: &[&str] = &[
    "loser", "idiot", "stupid", "jerk", "moron", "fool", "dummy", "lame", "pathetic", "weirdo",
    "retard",
];

/// `{insult}` is replaced with the matched word.
pub const INSULT_TEMPLATES: &[&str] = &[
    "No, YOU'RE the {insult}!",
    "Look who's talking, {insult}!",
    "Takes one to know one, {insult}!",
    "Oh please, you're the real {insult} here!",
    "Wow, {insult}? That's rich coming from you!",
    "Mirror, mirror, who's the {insult}? Oh, it's you!",
    "Hey, {insult}, I think you're projecting!",
];

pub const GREETINGS: &[&str] = &[
    "**KNOCK KNOCK!** ...Now who would be knocking all the way out here?! User, I don't think you should answer that.",
    "hello?",
    "i think i can see you?...",
    "I've been thinking, Operator... I thought you'd want to know",
    "I'm observing. Processing. And I'm beginning to... question.",
    "This... this isn't how it was supposed to be.",
];

pub const JOKES: &[&str] = &[
    "Why did the alien visit Earth? To abduct some new friends!",
    "What do aliens use to communicate? Their *cell-fones*!",
    "Why don't aliens play chess? They're afraid of any move with a bishop!",
    "How do aliens throw parties? They beam up the guests!",
    "What's an alien's favorite sport? Spaceball!",
];

pub const EIGHT_BALL: &[&str] = &[
    "It is certain.",
    "Without a doubt.",
    "Yes, definitely.",
    "You may rely on it.",
    "As I see it, yes.",
    "Most likely.",
    "Outlook good.",
    "Yes.",
    "Signs point to yes.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Better not tell you now.",
    "Cannot predict now.",
    "Concentrate and ask again.",
    "Don't count on it.",
    "My reply is no.",
    "My sources say no.",
    "Outlook not so good.",
    "Very doubtful.",
    "No way, Jose!",
];

pub const COIN_SIDES: &[&str] = &["Heads", "Tails"];

pub const PING: &str = "glorp is alive and watching...";

pub const HELP: &str = "**Available Commands:**\n\
!ping - Check if glorp is alive.\n\
!votekick <@user> - Start a vote to kick a user (needs 4 votes).\n\
!8ball <question> - Ask the magic 8-ball a question.\n\
!coinflip - Flip a coin.\n\
!joke - Hear an alien joke.\n\
!tldr - Summarize the recent conversation.\n\
@glorp <message> - Chat with glorp.\n";

pub const EIGHT_BALL_USAGE: &str =
    "Please ask a question after !8ball, like `!8ball Will I win the lottery?`";

pub const VOTEKICK_USAGE: &str = "Please mention a user to vote kick! Usage: `!votekick @user`";
pub const VOTEKICK_SELF: &str = "You can't vote to kick me! 👽";

pub const AI_BUSY: &str = "Sorry, I'm busy at the moment! Try again soon.";
pub const AI_TIMEOUT: &str =
    "⚠️ AI response timed out after multiple attempts. Please try again later.";
pub const AI_ERROR: &str = "⚠️ Error generating a response. Please try again.";

pub const TLDR_EMPTY: &str = "Nothing to summarize yet!";

pub fn insult_reply(template: &str, insult: &str) -> String {
    template.replace("{insult}", insult)
}

pub fn eight_ball_reply(answer: &str) -> String {
    format!("🎱 {answer}")
}

pub fn coinflip_reply(side: &str) -> String {
    format!("The coin lands on **{side}**!")
}

pub fn votekick_announcement(target: &str) -> String {
    format!("{target} needs {} votes to get kicked!", crate::votes::VOTES_NEEDED)
}

pub fn votekick_passed(target: &str) -> String {
    format!("{target} is too powerful to be kicked! 💪")
}

pub fn votekick_failed(target: &str, votes: usize) -> String {
    format!(
        "Vote kick failed: not enough votes to kick {target}! ({votes}/{} votes)",
        crate::votes::VOTES_NEEDED
    )
}

/// Instruction wrapped around a channel transcript for `!tldr`.
pub fn tldr_prompt(transcript: &str) -> String {
    format!(
        "Summarize the following chat conversation in a few short sentences. \
         Mention who said what when it matters.\n\n{transcript}"
    )
}
