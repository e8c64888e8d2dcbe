use rand::Rng;

/// Symbols the random part of a password is drawn from. `v` and `V` are
/// left out.
pub const PASSWORD_ALPHABET: &str =
    "abcdefghijklmnopqrstuwxyzABCDEFGHIJKLMNOPQRSTUWXYZ0123456789";

/// Appended to every password so it always holds an upper and lower case
/// letter, a digit and a symbol.
pub const PASSWORD_SUFFIX: &str = "!2Da";

const RANDOM_LENGTH: usize = 8;

/// Generate a password that passes the site's composition rules.
pub fn generate_password() -> String {
    let alphabet = PASSWORD_ALPHABET.as_bytes();
    let mut rng = rand::thread_rng();

    let mut password: String = (0..RANDOM_LENGTH)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect();
    password.push_str(PASSWORD_SUFFIX);
    password
}
