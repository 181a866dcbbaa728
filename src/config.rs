pub mod env_var {
    use lazy_static::lazy_static;

    lazy_static! {
        static ref ENV_VAR: EnvVar = EnvVar::from_env();
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Storage {
        Memory,
        Postgres,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Broker {
        Local,
        Kafka,
        Disabled,
    }

    /// Concurrency of each workload lane.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PoolSizes {
        pub question_fetch: usize,
        pub answer_fetch: usize,
        pub search_processing: usize,
        pub vote_calculation: usize,
        pub batch_processing: usize,
    }

    impl Default for PoolSizes {
        fn default() -> Self {
            Self {
                question_fetch: 5,
                answer_fetch: 5,
                search_processing: 3,
                vote_calculation: 3,
                batch_processing: 5,
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct DatabaseVar {
        pub host: String,
        pub port: u16,
        pub name: String,
        pub user: String,
        pub password: String,
        pub url: String,
    }

    #[derive(Debug, Clone)]
    pub struct EnvVar {
        pub port: u16,
        pub storage: Storage,
        pub database: Option<DatabaseVar>,
        pub broker: Broker,
        pub kafka_bootstrap_servers: Vec<String>,
        pub kafka_auto_create_topics: bool,
        pub pools: PoolSizes,
    }

    macro_rules! get_env {
        ($env:literal) => {
            std::env::var($env).expect(concat!("Missing env var ", $env))
        };
    }

    macro_rules! env_or {
        ($env:literal, $default:expr) => {
            match std::env::var($env) {
                Ok(value) => value
                    .parse()
                    .expect(concat!("Invalid ", $env)),
                Err(_) => $default,
            }
        };
    }

    pub fn load_database() -> DatabaseVar {
        let host = get_env!("DATABASE_HOST");
        let name = get_env!("DATABASE_NAME");
        let user = get_env!("DATABASE_USER");
        let password = get_env!("DATABASE_PASSWORD");
        let port: u16 = get_env!("DATABASE_PORT")
            .parse()
            .expect("Invalid DATABASE_PORT");

        let url = format!("postgres://{user}:{password}@{host}:{port}/{name}");

        DatabaseVar {
            host,
            port,
            name,
            user,
            password,
            url,
        }
    }

    impl EnvVar {
        /// Read the process environment.
        ///
        /// # Panic
        ///
        /// Panics when a variable is present but malformed, or when the
        /// postgres storage is selected without its database variables.
        pub fn from_env() -> Self {
            let storage = match std::env::var("FORUM_STORAGE").as_deref() {
                Ok("postgres") => Storage::Postgres,
                Ok("memory") | Err(_) => Storage::Memory,
                Ok(other) => panic!("Invalid FORUM_STORAGE {other}"),
            };

            let broker = match std::env::var("FORUM_BROKER").as_deref() {
                Ok("local") | Err(_) => Broker::Local,
                Ok("kafka") => Broker::Kafka,
                Ok("disabled") => Broker::Disabled,
                Ok(other) => panic!("Invalid FORUM_BROKER {other}"),
            };

            let database = match storage {
                Storage::Postgres => Some(load_database()),
                Storage::Memory => None,
            };

            let kafka_bootstrap_servers: String =
                env_or!("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092".to_string());

            let defaults = PoolSizes::default();
            let pools = PoolSizes {
                question_fetch: env_or!("FORUM_POOL_QUESTION_FETCH", defaults.question_fetch),
                answer_fetch: env_or!("FORUM_POOL_ANSWER_FETCH", defaults.answer_fetch),
                search_processing: env_or!("FORUM_POOL_SEARCH", defaults.search_processing),
                vote_calculation: env_or!("FORUM_POOL_VOTE", defaults.vote_calculation),
                batch_processing: env_or!("FORUM_POOL_BATCH", defaults.batch_processing),
            };

            EnvVar {
                port: env_or!("PORT", 8080),
                storage,
                database,
                broker,
                kafka_bootstrap_servers: kafka_bootstrap_servers
                    .split(',')
                    .map(str::trim)
                    .filter(|server| !server.is_empty())
                    .map(String::from)
                    .collect(),
                kafka_auto_create_topics: env_or!("KAFKA_AUTO_CREATE_TOPICS", true),
                pools,
            }
        }
    }

    pub fn get() -> &'static EnvVar {
        &ENV_VAR
    }

    #[cfg(test)]
    mod tests {
        use pretty_assertions::assert_eq;
        use serial_test::serial;

        use super::*;

        const VARS: [&str; 9] = [
            "PORT",
            "FORUM_STORAGE",
            "FORUM_BROKER",
            "KAFKA_BOOTSTRAP_SERVERS",
            "KAFKA_AUTO_CREATE_TOPICS",
            "FORUM_POOL_QUESTION_FETCH",
            "FORUM_POOL_SEARCH",
            "FORUM_POOL_BATCH",
            "DATABASE_HOST",
        ];

        fn clear() {
            for var in VARS {
                std::env::remove_var(var);
            }
        }

        #[test]
        #[serial]
        fn defaults_without_environment() {
            clear();
            let env = EnvVar::from_env();

            assert_eq!(env.port, 8080);
            assert_eq!(env.storage, Storage::Memory);
            assert_eq!(env.broker, Broker::Local);
            assert!(env.database.is_none());
            assert_eq!(env.kafka_bootstrap_servers, vec!["localhost:9092".to_string()]);
            assert!(env.kafka_auto_create_topics);
            assert_eq!(env.pools, PoolSizes::default());
        }

        #[test]
        #[serial]
        fn overrides_from_environment() {
            clear();
            std::env::set_var("PORT", "9000");
            std::env::set_var("FORUM_BROKER", "disabled");
            std::env::set_var("KAFKA_BOOTSTRAP_SERVERS", "a:9092, b:9093,");
            std::env::set_var("KAFKA_AUTO_CREATE_TOPICS", "false");
            std::env::set_var("FORUM_POOL_SEARCH", "7");

            let env = EnvVar::from_env();
            clear();

            assert_eq!(env.port, 9000);
            assert_eq!(env.broker, Broker::Disabled);
            assert_eq!(
                env.kafka_bootstrap_servers,
                vec!["a:9092".to_string(), "b:9093".to_string()]
            );
            assert!(!env.kafka_auto_create_topics);
            assert_eq!(env.pools.search_processing, 7);
            assert_eq!(env.pools.question_fetch, 5);
        }

        #[test]
        #[serial]
        #[should_panic(expected = "Invalid FORUM_STORAGE")]
        fn rejects_unknown_storage() {
            clear();
            std::env::set_var("FORUM_STORAGE", "mongo");
            let result = std::panic::catch_unwind(EnvVar::from_env);
            clear();
            if let Err(panic) = result {
                std::panic::resume_unwind(panic);
            }
        }
    }
}
