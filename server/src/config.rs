use std::env;
use std::fmt::Debug;
use std::str::FromStr;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the named environment variable parsed as `T`, or `default`
/// if it is not set. Panics if it is set but does not parse.
pub fn get_parsed_variable_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    match env::var(name) {
        Ok(value) => parse_variable(name, &value),
        Err(_) => default,
    }
}

/// Returns the named environment variable parsed as `T` or panics.
pub fn get_parsed_variable<T>(name: &str) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    parse_variable(name, &get_variable(name))
}

fn parse_variable<T>(name: &str, value: &str) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    value
        .parse()
        .unwrap_or_else(|e| panic!("could not parse {} ({:?}): {:?}", name, value, e))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn falls_back_to_default_when_unset() {
        let value: u32 = get_parsed_variable_or("CHRONOS_TEST_SURELY_UNSET_VARIABLE", 3600);

        assert_eq!(value, 3600);
    }

    #[test]
    fn parses_set_variables() {
        env::set_var("CHRONOS_TEST_PARSED_OFFSET", "-300");

        let value: i16 = get_parsed_variable_or("CHRONOS_TEST_PARSED_OFFSET", 0);

        assert_eq!(value, -300);
    }

    #[test]
    #[should_panic(expected = "could not parse CHRONOS_TEST_BAD_PORT")]
    fn panics_on_unparseable_values() {
        env::set_var("CHRONOS_TEST_BAD_PORT", "eighty");

        let _: u16 = get_parsed_variable("CHRONOS_TEST_BAD_PORT");
    }
}
