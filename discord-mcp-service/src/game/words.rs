//! Secret words for the guessing game. All lowercase ASCII.

pub const WORDS: &[&str] = &[
    "adder", "alpaca", "anchovy", "anole", "aphid", "axolotl", "badger", "bears", "beaver",
    "beetle", "bison", "bobcat", "booby", "bunting", "camel", "canary", "cattle", "chicken",
    "chimp", "cicada", "cobra", "conch", "condor", "coral", "cougar", "crane", "cricket",
    "curlew", "donkey", "dragon", "eagle", "egret", "falcon", "ferret", "finch", "foxes",
    "gannet", "gecko", "goats", "goose", "gopher", "gorilla", "grouper", "grouse", "halibut",
    "hares", "hawks", "heron", "herring", "hippo", "hornet", "horse", "hyena", "iguana",
    "jackal", "jaguar", "kestrel", "koala", "larva", "lemur", "lions", "lizard", "llama",
    "lobster", "locust", "louse", "macaw", "mamba", "manta", "mantis", "marlin", "marmot",
    "mayfly", "monitor", "monkey", "moose", "mouse", "mussel", "nurse", "ocelot", "octopus",
    "osprey", "otter", "oyster", "panda", "parrot", "pelican", "perch", "petrel", "pigeon",
    "plaice", "plover", "possum", "puffin", "python", "quail", "rabbit", "racer", "rattler",
    "raven", "rhino", "roach", "robin", "salmon", "sardine", "scallop", "shark", "sheep",
    "shrew", "shrimp", "skate", "skink", "skunk", "sloth", "snake", "snapper", "spider",
    "sponge", "squid", "stork", "sunfish", "termite", "thrush", "tiger", "trout", "turbot",
    "turkey", "turtle", "urchin", "viper", "vulture", "weasel", "weevil", "whale", "wigeon",
    "wolves", "wombat", "wrasse", "zebra",
];
